use std::fmt::Write;

use crate::pipeline::Diagnostic;
use crate::report::{RunReport, Source};

use super::styling::{failure_mark, paint, section_heading, verdict, Tone};
use super::tables::{count_cell, create_table, cyan_header, diagnostic_kind_cell};

/// Prints a short human-readable summary of a generate run to stderr.
///
/// Stdout is reserved for the machine-readable status line.
pub fn print_run_summary(report: &RunReport) {
    eprintln!("{}", render_run_summary(report));
}

/// Prints validator findings as a table to stderr.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    eprintln!("{}", render_diagnostics(diagnostics));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{}", section_heading(emoji, title));
}

pub fn render_run_summary(report: &RunReport) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🛠", "Pipeline");

    let source = match report.source {
        Source::Llm => "model output (repaired)",
        Source::Template => "template",
    };
    let stages = if report.stages.is_empty() {
        paint(Tone::Muted, "none").to_string()
    } else {
        report.stages.join("\n")
    };

    let mut table = create_table();
    table.set_header(cyan_header(&["Field", "Value"]));
    table.add_row(vec!["Project type", report.project_type.as_str()]);
    table.add_row(vec!["Source", source]);
    table.add_row(vec!["Written to".to_string(), report.output.display().to_string()]);
    table.add_row(vec!["Stages".to_string(), stages]);
    table.add_row(vec![
        comfy_table::Cell::new("Diagnostics"),
        count_cell(report.diagnostics.len()),
    ]);
    let _ = writeln!(output, "{table}");

    output.push_str(&render_diagnostics(&report.diagnostics));
    output
}

pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", verdict(diagnostics.len()));
    if diagnostics.is_empty() {
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Kind", "Details"]));
    for diagnostic in diagnostics {
        table.add_row(vec![
            diagnostic_kind_cell(diagnostic.kind),
            comfy_table::Cell::new(&diagnostic.message),
        ]);
    }
    let _ = writeln!(output, "{table}");
    output
}

/// One-line error rendering for terminal users; the status line carries the
/// same message for machines.
pub fn render_error(message: &str) -> String {
    format!("{} {}", failure_mark(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::validate_structure;
    use std::path::PathBuf;

    #[test]
    fn test_render_diagnostics_lists_every_finding() {
        let diagnostics = validate_structure("pipeline { steps { } ");
        let text = render_diagnostics(&diagnostics);
        assert!(text.contains("structural problem(s) found"));
        assert!(text.contains("missing_agent"));
        assert!(text.contains("Brace mismatch: 2 opening, 1 closing"));
    }

    #[test]
    fn test_render_diagnostics_when_clean() {
        assert!(render_diagnostics(&[]).contains("No structural problems found"));
    }

    #[test]
    fn test_render_run_summary() {
        let report = RunReport {
            generated_at: chrono::Utc::now(),
            input: PathBuf::from("project.json"),
            output: PathBuf::from("Jenkinsfile"),
            project_type: "nodejs".to_string(),
            source: Source::Template,
            stages: vec!["Build".to_string(), "Test".to_string()],
            diagnostics: Vec::new(),
        };
        let text = render_run_summary(&report);
        assert!(text.contains("nodejs"));
        assert!(text.contains("template"));
        assert!(text.contains("Jenkinsfile"));
        assert!(text.contains("Test"));
    }

    #[test]
    fn test_render_error_keeps_message() {
        assert!(render_error("Failed to read x").contains("Failed to read x"));
    }
}
