use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::project::Platform;

/// Configuration file structure for jenkinsfix.
///
/// Holds rendering preferences for generated pipelines and limits for the
/// repository analyzer. The loaded value is passed explicitly to whatever needs
/// it; nothing reads configuration from global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Pipeline rendering and repair options
    #[serde(default)]
    pub render: RenderConfig,

    /// Repository analysis limits
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RenderConfig {
    /// Spaces per nesting level
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Agent platform; selects script variants and `bat` vs `sh`
    #[serde(default)]
    pub platform: Platform,

    /// Branch used by the canonical `when` guard
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Step emitted for stages without any known command
    #[serde(default = "default_placeholder_step")]
    pub placeholder_step: String,

    /// Image tag for the synthesized docker build
    #[serde(default = "default_docker_tag")]
    pub docker_tag: String,

    /// Replace existing steps with project commands when they are known
    #[serde(default)]
    pub override_steps: bool,

    /// Extra `environment` entries (name -> Groovy expression)
    #[serde(default)]
    pub environment: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Maximum directory depth to walk
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of file paths recorded in the project description
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Directory names never descended into
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Pretty-print JSON files (reports, analysis output)
    #[serde(default)]
    pub pretty: bool,

    /// Default path for the run report
    pub report: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            platform: Platform::default(),
            default_branch: default_branch(),
            placeholder_step: default_placeholder_step(),
            docker_tag: default_docker_tag(),
            override_steps: false,
            environment: IndexMap::new(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_files: default_max_files(),
            ignore_dirs: default_ignore_dirs(),
        }
    }
}

fn default_indent() -> usize {
    4
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_placeholder_step() -> String {
    "echo 'TODO'".to_string()
}

fn default_docker_tag() -> String {
    "app:latest".to_string()
}

fn default_max_depth() -> usize {
    8
}

fn default_max_files() -> usize {
    20
}

fn default_ignore_dirs() -> Vec<String> {
    [
        ".git",
        "node_modules",
        "target",
        "venv",
        ".venv",
        "__pycache__",
        "dist",
        "build",
    ]
    .iter()
    .map(|d| (*d).to_string())
    .collect()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./jenkinsfix.toml
    /// 3. ./jenkinsfix.json
    /// 4. ./jenkinsfix.yaml
    /// 5. ./jenkinsfix.yml
    /// 6. `<user config dir>/jenkinsfix/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "jenkinsfix.toml",
            "jenkinsfix.json",
            "jenkinsfix.yaml",
            "jenkinsfix.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(user_config) = dirs::config_dir().map(|d| d.join("jenkinsfix").join("config.toml")) {
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }
}
