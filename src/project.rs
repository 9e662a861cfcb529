use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JenkinsfixError, Result};

/// Project description consumed by the pipeline generator.
///
/// Produced by the repository analyzer or supplied by an external scanner as
/// JSON. Both camelCase and snake_case keys are accepted because both spellings
/// exist in the data sets the generator was trained against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(rename = "type", default)]
    pub project_type: String,

    #[serde(default, alias = "build_tool")]
    pub build_tool: String,

    #[serde(default, alias = "test_frameworks")]
    pub test_frameworks: Vec<String>,

    #[serde(default, alias = "dockerfile_present")]
    pub dockerfile_present: bool,

    #[serde(default, deserialize_with = "deserialize_files")]
    pub files: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Per-stage scripts keyed by stage key (`build`, `test`, ...).
    #[serde(default)]
    pub scripts: IndexMap<String, ScriptVariants>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptVariants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<String>,
}

/// Target agent platform. Selects the script variant and the shell step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Windows,
    Unix,
}

impl Platform {
    /// Jenkins step used to run a command on this platform.
    pub fn shell_step(self) -> &'static str {
        match self {
            Platform::Windows => "bat",
            Platform::Unix => "sh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKey {
    Build,
    Test,
    Lint,
    Docker,
    Deploy,
}

impl StageKey {
    pub const ALL: [StageKey; 5] = [
        StageKey::Build,
        StageKey::Test,
        StageKey::Lint,
        StageKey::Docker,
        StageKey::Deploy,
    ];

    /// Key used in the `scripts` map.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::Build => "build",
            StageKey::Test => "test",
            StageKey::Lint => "lint",
            StageKey::Docker => "docker",
            StageKey::Deploy => "deploy",
        }
    }

    /// Canonical Jenkins stage name.
    pub fn stage_name(self) -> &'static str {
        match self {
            StageKey::Build => "Build",
            StageKey::Test => "Test",
            StageKey::Lint => "Lint",
            StageKey::Docker => "Build Docker Image",
            StageKey::Deploy => "Deploy",
        }
    }
}

impl ScriptVariants {
    pub fn new(unix: impl Into<String>, windows: impl Into<String>) -> Self {
        Self {
            unix: Some(unix.into()),
            windows: Some(windows.into()),
        }
    }

    /// Picks the variant for `platform`, falling back to the other one.
    /// Blank commands count as missing.
    pub fn select(&self, platform: Platform) -> Option<&str> {
        let (preferred, fallback) = match platform {
            Platform::Windows => (&self.windows, &self.unix),
            Platform::Unix => (&self.unix, &self.windows),
        };
        non_blank(preferred).or_else(|| non_blank(fallback))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ProjectConfig {
    /// Script command for `key`, if the project declares one.
    pub fn script(&self, key: StageKey, platform: Platform) -> Option<&str> {
        self.scripts.get(key.as_str()).and_then(|s| s.select(platform))
    }

    /// Project type for human-readable messages.
    pub fn display_type(&self) -> &str {
        let trimmed = self.project_type.trim();
        if trimmed.is_empty() {
            "project"
        } else {
            trimmed
        }
    }

    /// Parses a project document.
    ///
    /// Accepts the bare project object, `{"project": {...}}`,
    /// `{"input": {"project": {...}}}` and training entries whose `input` is a
    /// JSON-encoded string of one of those forms.
    ///
    /// # Errors
    ///
    /// Returns [`JenkinsfixError::InvalidProject`] when the text is not JSON or
    /// a field carries a value of the wrong type.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| JenkinsfixError::InvalidProject(format!("not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Same as [`ProjectConfig::from_json_str`] for an already parsed value.
    pub fn from_value(value: Value) -> Result<Self> {
        let project = unwrap_envelope(value)?;
        if !project.is_object() {
            return Err(JenkinsfixError::InvalidProject(
                "project description must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(project).map_err(|e| JenkinsfixError::InvalidProject(e.to_string()))
    }
}

fn unwrap_envelope(value: Value) -> Result<Value> {
    match value {
        Value::Object(mut map) => {
            if let Some(input) = map.remove("input") {
                let inner = match input {
                    Value::String(encoded) => serde_json::from_str(&encoded).map_err(|e| {
                        JenkinsfixError::InvalidProject(format!("`input` is not valid JSON: {e}"))
                    })?,
                    other => other,
                };
                return unwrap_envelope(inner);
            }
            if let Some(project) = map.remove("project") {
                return Ok(project);
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Path(String),
    Sample { path: String },
}

fn deserialize_files<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries = Vec::<FileEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            FileEntry::Path(path) | FileEntry::Sample { path } => path,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_camel_case_project() {
        let project = ProjectConfig::from_json_str(
            r#"{
                "type": "python",
                "buildTool": "pip",
                "testFrameworks": ["pytest"],
                "dockerfilePresent": true,
                "files": ["app.py"],
                "dependencies": ["flask"],
                "scripts": {"build": {"unix": "pip install .", "windows": "pip install -r requirements.txt"}}
            }"#,
        )
        .unwrap();

        assert_eq!(project.project_type, "python");
        assert_eq!(project.build_tool, "pip");
        assert!(project.dockerfile_present);
        assert_eq!(project.files, vec!["app.py"]);
        assert_eq!(
            project.script(StageKey::Build, Platform::Windows),
            Some("pip install -r requirements.txt")
        );
        assert_eq!(project.script(StageKey::Build, Platform::Unix), Some("pip install ."));
    }

    #[test]
    fn test_parse_snake_case_envelope_with_samples() {
        let project = ProjectConfig::from_json_str(
            r#"{"input": {"project": {
                "type": "java",
                "build_tool": "maven",
                "test_frameworks": ["junit5"],
                "dockerfile_present": false,
                "files": [{"path": "pom.xml", "content": "<project/>"}]
            }}}"#,
        )
        .unwrap();

        assert_eq!(project.build_tool, "maven");
        assert_eq!(project.test_frameworks, vec!["junit5"]);
        assert_eq!(project.files, vec!["pom.xml"]);
    }

    #[test]
    fn test_parse_training_entry_with_encoded_input() {
        let entry = serde_json::json!({
            "instruction": "Generate a Jenkins pipeline",
            "input": "{\"project\":{\"type\":\"nodejs\",\"buildTool\":\"npm\"}}"
        });
        let project = ProjectConfig::from_value(entry).unwrap();
        assert_eq!(project.project_type, "nodejs");
        assert_eq!(project.build_tool, "npm");
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let result = ProjectConfig::from_json_str(r#"{"dockerfilePresent": "yes"}"#);
        assert!(matches!(result, Err(JenkinsfixError::InvalidProject(_))));

        let result = ProjectConfig::from_json_str(r#"{"scripts": {"build": {"unix": 42}}}"#);
        assert!(matches!(result, Err(JenkinsfixError::InvalidProject(_))));

        let result = ProjectConfig::from_json_str("[1, 2]");
        assert!(matches!(result, Err(JenkinsfixError::InvalidProject(_))));
    }

    #[test]
    fn test_select_falls_back_and_skips_blank() {
        let only_unix = ScriptVariants {
            unix: Some("make".to_string()),
            windows: Some("   ".to_string()),
        };
        assert_eq!(only_unix.select(Platform::Windows), Some("make"));
        assert_eq!(ScriptVariants::default().select(Platform::Unix), None);
    }

    #[test]
    fn test_display_type_defaults() {
        assert_eq!(ProjectConfig::default().display_type(), "project");
    }
}
