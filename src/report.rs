use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pipeline::{Diagnostic, RepairOutcome};
use crate::project::ProjectConfig;

/// Where the pipeline text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Llm,
    Template,
}

/// Record of one generate run, written when a report path is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub project_type: String,
    pub source: Source,
    pub stages: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(
        input: &Path,
        output: &Path,
        project: &ProjectConfig,
        source: Source,
        outcome: &RepairOutcome,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            project_type: project.display_type().to_string(),
            source,
            stages: outcome.stages.clone(),
            diagnostics: outcome.diagnostics.clone(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn write(&self, path: &Path, pretty: bool) -> anyhow::Result<()> {
        let json = self.to_json(pretty)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::pipeline::repair_pipeline;
    use tempfile::TempDir;

    fn report() -> RunReport {
        let project = ProjectConfig::from_json_str(r#"{"type": "python"}"#).unwrap();
        let outcome = repair_pipeline(
            "stage('Build') { steps { bat 'pip install .' } }",
            &project,
            &RenderConfig::default(),
        );
        RunReport::new(
            Path::new("project.json"),
            Path::new("Jenkinsfile"),
            &project,
            Source::Llm,
            &outcome,
        )
    }

    #[test]
    fn test_report_fields() {
        let report = report();
        let value: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        assert_eq!(value["source"], "llm");
        assert_eq!(value["project_type"], "python");
        assert_eq!(value["stages"], serde_json::json!(["Build"]));
        assert_eq!(value["diagnostics"], serde_json::json!([]));
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        report().write(&path, true).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        let parsed: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.source, Source::Llm);
        assert_eq!(parsed.output, PathBuf::from("Jenkinsfile"));
    }

    #[test]
    fn test_write_to_missing_directory_fails_with_path() {
        let err = report()
            .write(Path::new("/no/such/dir/report.json"), false)
            .unwrap_err();
        assert!(err.to_string().contains("/no/such/dir/report.json"));
    }
}
