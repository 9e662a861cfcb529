mod styling;
mod summary;
mod tables;

use console::Term;
use serde::Serialize;

use crate::pipeline::Diagnostic;
use styling::{paint, Tone};
pub use summary::{print_diagnostics, print_run_summary, render_error};

/// Whether decorative output should be written to stderr.
pub fn stderr_is_terminal() -> bool {
    Term::stderr().is_term()
}

/// Prints the `jenkinsfix` banner to stderr when stderr is a terminal.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    if !stderr_is_terminal() {
        return;
    }
    eprintln!(
        r"
{} {}
  {}
",
        paint(Tone::Brand, "🔧 jenkinsfix"),
        paint(Tone::Muted, env!("CARGO_PKG_VERSION")),
        paint(Tone::Muted, "Jenkinsfile repair and generation")
    );
}

/// The single JSON line written to stdout when the process ends.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Status {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostics: Option<Vec<Diagnostic>>,
    },
    Error {
        error: String,
    },
}

impl Status {
    pub fn success() -> Self {
        Status::Success { diagnostics: None }
    }

    pub fn with_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Status::Success {
            diagnostics: Some(diagnostics),
        }
    }

    pub fn error(err: &anyhow::Error) -> Self {
        Status::Error {
            error: format!("{err:#}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success { .. })
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({"status": "error", "error": e.to_string()}).to_string()
        })
    }
}

pub fn print_status(status: &Status) {
    println!("{}", status.to_line());
}
