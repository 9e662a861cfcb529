use indexmap::IndexMap;
use log::debug;

use super::tree::{self, Block, Node};
use crate::config::RenderConfig;
use crate::project::ProjectConfig;

/// Wraps repaired stage blocks into the canonical pipeline skeleton.
///
/// Empty block strings are skipped; with no blocks at all the result still
/// carries an empty `stages` section. A final lexical pass makes the number of
/// `{` and `}` equal.
pub fn assemble_pipeline(blocks: &[String], project: &ProjectConfig, render: &RenderConfig) -> String {
    let mut stages = Block::new("stages", Vec::new());
    for block in blocks.iter().filter(|b| !b.trim().is_empty()) {
        let doc = tree::parse(block);
        if doc.unclosed > 0 || doc.stray_closers > 0 {
            debug!(
                "Stage block closed {} open block(s) and skipped {} stray brace(s)",
                doc.unclosed, doc.stray_closers
            );
        }
        stages.body.extend(doc.nodes);
    }

    let pipeline = Block::new(
        "pipeline",
        vec![
            Node::Statement("agent any".to_string()),
            Node::Block(environment_block(project, render)),
            Node::Block(stages),
            Node::Block(post_block(project)),
        ],
    );

    balance_braces(pipeline.render(0, render.indent).trim_end())
}

fn environment_block(project: &ProjectConfig, render: &RenderConfig) -> Block {
    let mut entries: IndexMap<String, String> = IndexMap::new();
    entries.insert("BUILD_TAG".to_string(), "\"${env.BUILD_ID}\"".to_string());
    if project.project_type.trim().eq_ignore_ascii_case("python") {
        entries.insert("PYTHON_VERSION".to_string(), "'3.9'".to_string());
        entries.insert("PIP_CACHE_DIR".to_string(), "'.pip-cache'".to_string());
    }
    for (name, value) in &render.environment {
        entries.insert(name.clone(), value.clone());
    }

    Block::new(
        "environment",
        entries
            .into_iter()
            .map(|(name, value)| Node::Statement(format!("{name} = {value}")))
            .collect(),
    )
}

fn post_block(project: &ProjectConfig) -> Block {
    let project_type: String = project
        .display_type()
        .chars()
        .filter(|c| c.is_alphanumeric() || " -_.+#".contains(*c))
        .collect();

    let echo = |outcome: &str| {
        Node::Statement(format!(
            "echo \"Build for {project_type} {outcome} with tag ${{env.BUILD_TAG}}!\""
        ))
    };

    Block::new(
        "post",
        vec![
            Node::Block(Block::new("always", vec![Node::Statement("cleanWs()".to_string())])),
            Node::Block(Block::new("success", vec![echo("succeeded")])),
            Node::Block(Block::new("failure", vec![echo("failed")])),
        ],
    )
}

/// Appends missing `}` or removes the last surplus ones so that both counts
/// match. Restores lexical balance only.
pub fn balance_braces(text: &str) -> String {
    let open = text.matches('{').count();
    let close = text.matches('}').count();

    if open > close {
        debug!("Appending {} closing brace(s)", open - close);
        return format!("{text}\n{}", "}".repeat(open - close));
    }
    if close > open {
        debug!("Removing {} surplus closing brace(s)", close - open);
        let mut surplus = close - open;
        let mut kept: Vec<char> = Vec::with_capacity(text.len());
        for c in text.chars().rev() {
            if c == '}' && surplus > 0 {
                surplus -= 1;
                continue;
            }
            kept.push(c);
        }
        return kept.into_iter().rev().collect::<String>().trim_end().to_string();
    }
    text.to_string()
}
