use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingPipeline,
    MissingAgent,
    MissingStages,
    EmptyStages,
    BraceMismatch,
    DoubledQuotes,
    EmptySteps,
    DuplicateSteps,
}

/// One structural defect found in pipeline text. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

struct Patterns {
    pipeline: Regex,
    agent: Regex,
    stages: Regex,
    empty_stages: Regex,
    doubled_quotes: Regex,
    empty_steps: Regex,
    duplicate_steps: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        pipeline: Regex::new(r"pipeline\s*\{").unwrap(),
        agent: Regex::new(r"agent\s+any").unwrap(),
        stages: Regex::new(r"stages\s*\{").unwrap(),
        empty_stages: Regex::new(r"stages\s*\{\s*\}").unwrap(),
        doubled_quotes: Regex::new(r"(?:bat|sh)\s+''[^']*''").unwrap(),
        empty_steps: Regex::new(r"steps\s*\{\s*\}").unwrap(),
        duplicate_steps: Regex::new(r"steps\s*\{[^}]*\}\s*steps\s*\{").unwrap(),
    })
}

/// Checks structural invariants of pipeline text without touching it.
pub fn validate_structure(pipeline: &str) -> Vec<Diagnostic> {
    let p = patterns();
    let mut diagnostics = Vec::new();

    if !p.pipeline.is_match(pipeline) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MissingPipeline,
            "Missing top-level pipeline block",
        ));
    }
    if !p.agent.is_match(pipeline) {
        diagnostics.push(Diagnostic::new(DiagnosticKind::MissingAgent, "Missing agent any"));
    }
    if !p.stages.is_match(pipeline) {
        diagnostics.push(Diagnostic::new(DiagnosticKind::MissingStages, "Missing stages block"));
    } else if p.empty_stages.is_match(pipeline) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::EmptyStages,
            "Stages block contains no stage",
        ));
    }

    let open = pipeline.matches('{').count();
    let close = pipeline.matches('}').count();
    if open != close {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::BraceMismatch,
            format!("Brace mismatch: {open} opening, {close} closing"),
        ));
    }

    let counted = [
        (
            &p.doubled_quotes,
            DiagnosticKind::DoubledQuotes,
            "Doubled quotes in shell commands",
        ),
        (&p.empty_steps, DiagnosticKind::EmptySteps, "Empty steps blocks"),
        (
            &p.duplicate_steps,
            DiagnosticKind::DuplicateSteps,
            "Duplicate steps blocks",
        ),
    ];
    for (pattern, kind, label) in counted {
        let found = pattern.find_iter(pipeline).count();
        if found > 0 {
            diagnostics.push(Diagnostic::new(kind, format!("{label}: {found} occurrence(s)")));
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pipeline: &str) -> Vec<DiagnosticKind> {
        validate_structure(pipeline).into_iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_valid_pipeline_has_no_diagnostics() {
        let pipeline = "pipeline {\n    agent any\n    stages {\n        stage('Build') {\n            steps {\n                sh 'make'\n            }\n        }\n    }\n}";
        assert!(validate_structure(pipeline).is_empty());
    }

    #[test]
    fn test_empty_text_reports_missing_sections() {
        assert_eq!(
            kinds(""),
            vec![
                DiagnosticKind::MissingPipeline,
                DiagnosticKind::MissingAgent,
                DiagnosticKind::MissingStages
            ]
        );
    }

    #[test]
    fn test_brace_mismatch_message() {
        let diagnostics = validate_structure("pipeline { agent any stages { stage('x') { steps { sh 'a' } }");
        let mismatch = diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::BraceMismatch)
            .unwrap();
        assert_eq!(mismatch.to_string(), "Brace mismatch: 4 opening, 2 closing");
    }

    #[test]
    fn test_counts_artifacts() {
        let pipeline = "pipeline { agent any stages { stage('a') { steps { bat ''pip'' } steps { } } stage('b') { steps {} } } }";
        let diagnostics = validate_structure(pipeline);
        let messages: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        assert!(messages.contains(&"Doubled quotes in shell commands: 1 occurrence(s)".to_string()));
        assert!(messages.contains(&"Empty steps blocks: 2 occurrence(s)".to_string()));
        assert!(messages.contains(&"Duplicate steps blocks: 1 occurrence(s)".to_string()));
    }

    #[test]
    fn test_empty_stages_reported() {
        assert_eq!(
            kinds("pipeline {\n    agent any\n    stages {\n    }\n}"),
            vec![DiagnosticKind::EmptyStages]
        );
    }

    #[test]
    fn test_validator_does_not_modify_input() {
        let text = String::from("pipeline { stages { }");
        let before = text.clone();
        let _ = validate_structure(&text);
        assert_eq!(text, before);
    }
}
