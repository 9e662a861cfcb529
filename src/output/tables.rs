use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::pipeline::DiagnosticKind;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Structural breakage in red, cosmetic leftovers in yellow.
pub fn diagnostic_kind_cell(kind: DiagnosticKind) -> Cell {
    let text = serde_json::to_value(kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{kind:?}"));
    match kind {
        DiagnosticKind::MissingPipeline
        | DiagnosticKind::MissingAgent
        | DiagnosticKind::MissingStages
        | DiagnosticKind::BraceMismatch => Cell::new(text).fg(TableColor::Red),
        DiagnosticKind::EmptyStages
        | DiagnosticKind::DoubledQuotes
        | DiagnosticKind::EmptySteps
        | DiagnosticKind::DuplicateSteps => Cell::new(text).fg(TableColor::Yellow),
    }
}

pub fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(TableColor::Green)
    } else {
        Cell::new(count).fg(TableColor::Yellow)
    }
}
