use thiserror::Error;

#[derive(Error, Debug)]
pub enum JenkinsfixError {
    #[error("Invalid project configuration: {0}")]
    InvalidProject(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Project analysis failed: {0}")]
    Analysis(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, JenkinsfixError>;
