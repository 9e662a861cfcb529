use log::debug;
use serde::Serialize;

use super::lexer::{self, Token, TokenKind};
use super::tree;

/// A complete `stage('NAME') { ... }` span cut out of raw pipeline text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageBlock {
    pub name: String,
    /// Source text from the `stage` keyword through the matching `}`.
    pub raw_body: String,
    /// Shell commands found anywhere inside the block, in source order.
    pub commands: Vec<String>,
}

/// Extracts every complete stage block in first-seen order.
///
/// Braces inside string literals and comments are ignored. A stage whose
/// closing brace never arrives (truncated generation) yields nothing; scanning
/// continues inside it so complete nested stages are still recovered.
pub fn extract_stage_blocks(text: &str) -> Vec<StageBlock> {
    let tokens: Vec<Token> = lexer::tokenize(text)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect();

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let Some((name, open)) = match_anchor(&tokens, i, text) else {
            i += 1;
            continue;
        };

        match matching_close(&tokens, open) {
            Some(close) => {
                let raw_body = text[tokens[i].start..tokens[close].end].to_string();
                let commands = shell_commands(&raw_body);
                blocks.push(StageBlock {
                    name,
                    raw_body,
                    commands,
                });
                i = close + 1;
            }
            None => {
                debug!("Stage '{}' is never closed, dropping it", name);
                i = open + 1;
            }
        }
    }

    debug!("Extracted {} stage blocks", blocks.len());
    blocks
}

/// Matches `stage ( <string> ) {` at `i`; returns the name and the index of
/// the opening brace.
fn match_anchor(tokens: &[Token], i: usize, text: &str) -> Option<(String, usize)> {
    let window = tokens.get(i..i + 5)?;
    let is_anchor = window[0].kind == TokenKind::Word
        && window[0].text(text) == "stage"
        && window[1].kind == TokenKind::OpenParen
        && window[2].kind == TokenKind::Str
        && window[3].kind == TokenKind::CloseParen
        && window[4].kind == TokenKind::OpenBrace;
    is_anchor.then(|| {
        let name = lexer::string_content(window[2].text(text)).to_string();
        (name, i + 4)
    })
}

fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open..].iter().enumerate() {
        match token.kind {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn shell_commands(raw_body: &str) -> Vec<String> {
    let doc = tree::parse(raw_body);
    let mut commands = Vec::new();
    for node in &doc.nodes {
        let statements = match node {
            tree::Node::Block(block) => block.statements(),
            tree::Node::Statement(text) => vec![text.as_str()],
        };
        commands.extend(statements.into_iter().filter_map(tree::shell_command));
    }
    commands
}
