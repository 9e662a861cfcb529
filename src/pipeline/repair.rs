use log::{debug, info, warn};

use super::extract::StageBlock;
use super::lexer::{self, TokenKind};
use super::steps::{commands_for, StageSteps};
use super::tree::{self, Block, Node};
use crate::config::RenderConfig;

/// Blocks that hold nested stages instead of steps.
const CONTAINERS: &[&str] = &["parallel", "stages", "matrix"];

/// Rewrites extracted stage blocks into valid declarative stages.
///
/// Each repaired stage ends up with exactly one non-empty `steps` section.
/// Stages that group nested stages (`parallel`, `stages`, `matrix`) get their
/// children repaired instead, since Jenkins rejects `steps` next to them.
pub struct BlockRepairer<'a> {
    steps: &'a StageSteps,
    render: &'a RenderConfig,
    dockerfile_present: bool,
}

impl<'a> BlockRepairer<'a> {
    pub fn new(steps: &'a StageSteps, render: &'a RenderConfig, dockerfile_present: bool) -> Self {
        Self {
            steps,
            render,
            dockerfile_present,
        }
    }

    /// Returns the repaired block text, or `None` when the stage is dropped.
    pub fn repair(&self, block: &StageBlock) -> Option<String> {
        let doc = tree::parse(&block.raw_body);
        let mut stage = doc.nodes.into_iter().find_map(|node| match node {
            Node::Block(b) if b.keyword() == "stage" => Some(b),
            _ => None,
        })?;

        if !self.repair_stage(&mut stage, &block.name) {
            return None;
        }
        Some(stage.render(0, self.render.indent).trim_end().to_string())
    }

    /// Repairs `stage` in place; false means the stage must be dropped.
    fn repair_stage(&self, stage: &mut Block, name: &str) -> bool {
        if !self.dockerfile_present && name.to_lowercase().contains("docker") {
            info!("Dropping stage '{}': project has no Dockerfile", name);
            return false;
        }

        normalize_statements(&mut stage.body);
        let relocated = self.relocate_when_commands(stage, name);
        remove_empty_when(stage);

        if is_container(stage) {
            self.repair_children(stage);
            if !relocated.is_empty() {
                warn!(
                    "Stage '{}' groups nested stages; discarding {} command(s) found in its when clause",
                    name,
                    relocated.len()
                );
            }
            return true;
        }

        let mut loose = take_loose_shell_statements(stage, name);
        loose.extend(relocated);
        collapse_steps(stage, name);
        self.fill_steps(stage, name, loose);
        true
    }

    fn repair_children(&self, container: &mut Block) {
        container.body.retain_mut(|node| match node {
            Node::Block(block) if block.keyword() == "stage" => {
                let name = block.label().unwrap_or_default();
                self.repair_stage(block, &name)
            }
            Node::Block(block) if CONTAINERS.contains(&block.keyword()) => {
                self.repair_children(block);
                true
            }
            _ => true,
        });
    }

    /// Moves shell steps out of `when` clauses; a `when` that held any gets
    /// the canonical branch guard as its only condition.
    fn relocate_when_commands(&self, stage: &mut Block, name: &str) -> Vec<String> {
        let mut relocated = Vec::new();
        for node in &mut stage.body {
            let Node::Block(when) = node else { continue };
            if when.keyword() != "when" {
                continue;
            }
            let before = relocated.len();
            take_shell_statements(&mut when.body, &mut relocated);
            if relocated.len() > before {
                debug!(
                    "Relocated {} command(s) out of the when clause of '{}'",
                    relocated.len() - before,
                    name
                );
                when.body = vec![Node::Block(branch_guard(&self.render.default_branch))];
            }
        }
        relocated
    }

    fn fill_steps(&self, stage: &mut Block, name: &str, relocated: Vec<String>) {
        let known = commands_for(self.steps, name);

        let index = match stage.body.iter().position(|n| is_steps(n)) {
            Some(index) => index,
            None => {
                stage.body.push(Node::Block(Block::new("steps", Vec::new())));
                stage.body.len() - 1
            }
        };
        let Node::Block(steps) = &mut stage.body[index] else {
            return;
        };

        if self.render.override_steps {
            if let Some(commands) = known {
                steps.body = self.shell_statements(commands);
            }
        }

        for statement in relocated {
            let node = Node::Statement(statement);
            if !steps.body.contains(&node) {
                steps.body.push(node);
            }
        }

        if !steps.has_content() {
            steps.body = match known {
                Some(commands) => {
                    debug!("Synthesized steps for '{}' from project commands", name);
                    self.shell_statements(commands)
                }
                None => {
                    debug!("No commands known for '{}', inserting placeholder", name);
                    vec![Node::Statement(self.render.placeholder_step.clone())]
                }
            };
        }
    }

    fn shell_statements(&self, commands: &[String]) -> Vec<Node> {
        let step = self.render.platform.shell_step();
        commands
            .iter()
            .map(|command| Node::Statement(format!("{step} {}", lexer::single_quoted(command))))
            .collect()
    }
}

/// `expression { env.BRANCH_NAME == '<branch>' }`
pub(super) fn branch_guard(branch: &str) -> Block {
    Block::new(
        "expression",
        vec![Node::Statement(format!(
            "env.BRANCH_NAME == {}",
            lexer::single_quoted(branch)
        ))],
    )
}

fn is_steps(node: &Node) -> bool {
    matches!(node, Node::Block(block) if block.keyword() == "steps")
}

fn is_container(stage: &Block) -> bool {
    CONTAINERS
        .iter()
        .any(|keyword| stage.child_blocks(keyword).next().is_some())
}

fn take_shell_statements(nodes: &mut Vec<Node>, out: &mut Vec<String>) {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Statement(text) if tree::is_shell_statement(&text) => out.push(text),
            Node::Block(mut block) => {
                take_shell_statements(&mut block.body, out);
                kept.push(Node::Block(block));
            }
            other => kept.push(other),
        }
    }
    *nodes = kept;
}

/// Shell steps written directly in the stage body, outside any block.
fn take_loose_shell_statements(stage: &mut Block, name: &str) -> Vec<String> {
    let mut loose = Vec::new();
    stage.body.retain(|node| match node {
        Node::Statement(text) if tree::is_shell_statement(text) => {
            loose.push(text.clone());
            false
        }
        _ => true,
    });
    if !loose.is_empty() {
        debug!("Moved {} loose command(s) of '{}' into steps", loose.len(), name);
    }
    loose
}

fn remove_empty_when(stage: &mut Block) {
    stage
        .body
        .retain(|node| !matches!(node, Node::Block(b) if b.keyword() == "when" && !b.has_content()));
}

/// Keeps the first `steps` block and drops the rest. An empty first block
/// takes over the body of the first later duplicate that has content.
fn collapse_steps(stage: &mut Block, name: &str) {
    let positions: Vec<usize> = stage
        .body
        .iter()
        .enumerate()
        .filter(|(_, node)| is_steps(node))
        .map(|(i, _)| i)
        .collect();
    let Some((&first, duplicates)) = positions.split_first() else {
        return;
    };
    if duplicates.is_empty() {
        return;
    }

    let first_empty = matches!(&stage.body[first], Node::Block(b) if !b.has_content());
    if first_empty {
        let replacement = duplicates.iter().find_map(|&i| match &stage.body[i] {
            Node::Block(b) if b.has_content() => Some(b.body.clone()),
            _ => None,
        });
        if let (Some(body), Node::Block(steps)) = (replacement, &mut stage.body[first]) {
            steps.body = body;
        }
    }

    for &i in duplicates.iter().rev() {
        stage.body.remove(i);
    }
    debug!(
        "Collapsed {} duplicate steps block(s) in '{}'",
        duplicates.len(),
        name
    );
}

fn normalize_statements(nodes: &mut [Node]) {
    for node in nodes {
        match node {
            Node::Statement(text) => {
                if let Some(fixed) = undouble_quotes(text) {
                    *text = fixed;
                }
            }
            Node::Block(block) => normalize_statements(&mut block.body),
        }
    }
}

/// `bat ''pip install''` -> `bat 'pip install'`.
fn undouble_quotes(statement: &str) -> Option<String> {
    let tokens: Vec<_> = lexer::tokenize(statement)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();
    let [step, open, inner @ .., close] = tokens.as_slice() else {
        return None;
    };
    let step = step.text(statement);
    let is_empty_literal = |t: &lexer::Token| t.kind == TokenKind::Str && t.text(statement) == "''";
    if !(step == "bat" || step == "sh")
        || !is_empty_literal(open)
        || !is_empty_literal(close)
        || inner.is_empty()
    {
        return None;
    }
    let command = &statement[inner[0].start..inner[inner.len() - 1].end];
    Some(format!("{step} {}", lexer::single_quoted(command)))
}
