//! Jenkinsfile repair engine.
//!
//! Raw model output is cut into stage blocks, each block is repaired against
//! the commands the project description implies, and the survivors are
//! reassembled into the canonical declarative skeleton. Every function here is
//! pure; callers may run repairs concurrently.

mod assemble;
mod extract;
mod lexer;
mod repair;
mod steps;
mod template;
mod tree;
mod validate;


use log::{debug, info, warn};
use serde::Serialize;

use crate::config::RenderConfig;
use crate::project::ProjectConfig;

pub use assemble::assemble_pipeline;
pub use extract::extract_stage_blocks;
pub use repair::BlockRepairer;
pub use steps::synthesize_steps;
pub use template::template_blocks;
pub use validate::{validate_structure, Diagnostic, DiagnosticKind};

/// Final pipeline text plus what the validator still found in it.
#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub pipeline: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Names of the top-level stages kept in the pipeline.
    pub stages: Vec<String>,
}

/// Turns raw model output into a structurally valid pipeline.
pub fn repair_pipeline(raw: &str, project: &ProjectConfig, render: &RenderConfig) -> RepairOutcome {
    let blocks = extract_stage_blocks(raw);
    if blocks.is_empty() {
        warn!("No stage blocks found in model output, emitting an empty stages section");
    }
    for block in &blocks {
        debug!("Extracted stage '{}' with commands {:?}", block.name, block.commands);
    }

    let steps = synthesize_steps(project, render);
    let repairer = BlockRepairer::new(&steps, render, project.dockerfile_present);
    let repaired: Vec<String> = blocks
        .iter()
        .filter_map(|block| repairer.repair(block))
        .collect();
    info!(
        "Kept {} of {} extracted stage block(s)",
        repaired.len(),
        blocks.len()
    );

    finish(assemble_pipeline(&repaired, project, render))
}

/// Builds a pipeline from the project description alone.
pub fn generate_from_template(project: &ProjectConfig, render: &RenderConfig) -> RepairOutcome {
    let steps = synthesize_steps(project, render);
    let blocks = template_blocks(&steps, render);
    info!("Generated {} stage(s) from the project description", blocks.len());
    finish(assemble_pipeline(&blocks, project, render))
}

fn finish(pipeline: String) -> RepairOutcome {
    let diagnostics = validate_structure(&pipeline);
    for diagnostic in &diagnostics {
        warn!("Pipeline check: {}", diagnostic);
    }
    let stages = extract_stage_blocks(&pipeline)
        .into_iter()
        .map(|block| block.name)
        .collect();
    RepairOutcome {
        pipeline,
        diagnostics,
        stages,
    }
}
