//! Block tree over lexed pipeline text.
//!
//! A pipeline is a nesting of `head { ... }` blocks whose bodies hold plain
//! statements (`agent any`, `sh 'make'`). Parsing is total: unclosed blocks
//! are closed at end of input and stray closers are skipped, both counted on
//! the returned [`Document`].

use super::lexer::{self, Token, TokenKind};

/// Steps that run a command through a shell.
pub const SHELL_STEPS: &[&str] = &["sh", "bat", "powershell", "pwsh"];

/// Words that start a new statement even without a line break.
const STEP_KEYWORDS: &[&str] = &["sh", "bat", "echo", "powershell", "pwsh"];

/// Block keywords that always render on multiple lines.
const STRUCTURAL: &[&str] = &[
    "pipeline",
    "agent",
    "environment",
    "stages",
    "stage",
    "steps",
    "script",
    "when",
    "parallel",
    "matrix",
    "axes",
    "axis",
    "options",
    "parameters",
    "triggers",
    "tools",
    "input",
    "post",
    "always",
    "success",
    "failure",
    "unstable",
    "changed",
    "fixed",
    "regression",
    "aborted",
    "cleanup",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Statement(String),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub head: String,
    pub body: Vec<Node>,
}

#[derive(Debug, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub unclosed: usize,
    pub stray_closers: usize,
}

impl Block {
    pub fn new(head: impl Into<String>, body: Vec<Node>) -> Self {
        Self {
            head: head.into(),
            body,
        }
    }

    /// Leading identifier of the head: `stage` for `stage('Build')`.
    pub fn keyword(&self) -> &str {
        let end = self
            .head
            .find(|c: char| c == '(' || c.is_whitespace())
            .unwrap_or(self.head.len());
        &self.head[..end]
    }

    /// First string literal in the head, e.g. the stage name.
    pub fn label(&self) -> Option<String> {
        lexer::tokenize(&self.head)
            .iter()
            .find(|t| t.kind == TokenKind::Str)
            .map(|t| lexer::string_content(t.text(&self.head)).to_string())
    }

    /// True when the subtree holds at least one non-comment statement.
    pub fn has_content(&self) -> bool {
        self.body.iter().any(|node| match node {
            Node::Statement(text) => !is_comment(text),
            Node::Block(block) => block.has_content(),
        })
    }

    pub fn child_blocks<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.body.iter().filter_map(move |node| match node {
            Node::Block(block) if block.keyword() == keyword => Some(block),
            _ => None,
        })
    }

    /// Every statement of the subtree in source order.
    pub fn statements(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_statements(&self.body, &mut out);
        out
    }

    pub fn render(&self, depth: usize, indent: usize) -> String {
        let mut out = String::new();
        render_block(self, depth, indent, &mut out);
        out
    }
}

fn collect_statements<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Statement(text) => out.push(text),
            Node::Block(block) => collect_statements(&block.body, out),
        }
    }
}

fn is_comment(text: &str) -> bool {
    text.starts_with("//") || text.starts_with("/*")
}

/// Leading word of a statement (`bat` for `bat 'make'`).
pub fn leading_word(statement: &str) -> Option<&str> {
    lexer::tokenize(statement)
        .into_iter()
        .find(|t| !t.is_trivia())
        .filter(|t| t.kind == TokenKind::Word)
        .map(|t| t.text(statement))
}

pub fn is_shell_statement(statement: &str) -> bool {
    leading_word(statement).is_some_and(|w| SHELL_STEPS.contains(&w))
}

/// Command passed to a shell step, taken from its first string literal.
pub fn shell_command(statement: &str) -> Option<String> {
    if !is_shell_statement(statement) {
        return None;
    }
    lexer::tokenize(statement)
        .iter()
        .find(|t| t.kind == TokenKind::Str)
        .map(|t| lexer::string_content(t.text(statement)).to_string())
}

pub fn parse(src: &str) -> Document {
    let mut parser = Parser {
        src,
        stack: vec![Block::new("", Vec::new())],
        pending: Vec::new(),
        paren_depth: 0,
        line_break: false,
        stray_closers: 0,
    };
    for token in lexer::tokenize(src) {
        parser.feed(token);
    }
    parser.finish()
}

struct Parser<'a> {
    src: &'a str,
    stack: Vec<Block>,
    pending: Vec<Token>,
    paren_depth: usize,
    line_break: bool,
    stray_closers: usize,
}

impl Parser<'_> {
    fn feed(&mut self, token: Token) {
        match token.kind {
            TokenKind::Space => return,
            TokenKind::Newline => {
                if self.paren_depth == 0 {
                    self.line_break = true;
                }
                return;
            }
            TokenKind::Semicolon => {
                self.flush();
                return;
            }
            _ => {}
        }

        // A head may sit on the line before its brace.
        if self.line_break && token.kind != TokenKind::OpenBrace {
            self.flush();
        }
        self.line_break = false;

        match token.kind {
            TokenKind::OpenBrace => self.open_block(),
            TokenKind::CloseBrace => self.close_block(),
            TokenKind::Word => {
                let starts_step = STEP_KEYWORDS.contains(&token.text(self.src));
                let after_argument = self
                    .pending
                    .last()
                    .is_some_and(|t| matches!(t.kind, TokenKind::Str | TokenKind::CloseParen));
                if starts_step
                    && after_argument
                    && self.paren_depth == 0
                    && !self.opens_doubled_quote()
                {
                    self.flush();
                }
                self.pending.push(token);
            }
            TokenKind::OpenParen => {
                self.paren_depth += 1;
                self.pending.push(token);
            }
            TokenKind::CloseParen => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.pending.push(token);
            }
            _ => self.pending.push(token),
        }
    }

    /// `bat ''` or `sh ''` so far: the empty literal is the first half of a
    /// doubled quote and the words after it belong to the same command.
    fn opens_doubled_quote(&self) -> bool {
        match self.pending.as_slice() {
            [.., step, quote] => {
                quote.kind == TokenKind::Str
                    && quote.text(self.src) == "''"
                    && step.kind == TokenKind::Word
                    && matches!(step.text(self.src), "bat" | "sh")
            }
            _ => false,
        }
    }

    fn open_block(&mut self) {
        let split = head_start(&self.pending, self.src);
        let head = self.span_text(&self.pending[split..]);
        self.pending.truncate(split);
        self.flush();
        self.stack.push(Block::new(single_line(&head), Vec::new()));
    }

    fn close_block(&mut self) {
        self.flush();
        if self.stack.len() > 1 {
            self.pop_into_parent();
        } else {
            self.stray_closers += 1;
        }
    }

    fn pop_into_parent(&mut self) {
        if let Some(block) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.body.push(Node::Block(block));
            }
        }
    }

    fn span_text(&self, tokens: &[Token]) -> String {
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => self.src[first.start..last.end].to_string(),
            _ => String::new(),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = self.span_text(&self.pending);
            if let Some(top) = self.stack.last_mut() {
                top.body.push(Node::Statement(text));
            }
            self.pending.clear();
        }
        self.paren_depth = 0;
        self.line_break = false;
    }

    fn finish(mut self) -> Document {
        self.flush();
        let unclosed = self.stack.len() - 1;
        while self.stack.len() > 1 {
            self.pop_into_parent();
        }
        let root = self.stack.pop().unwrap_or_else(|| Block::new("", Vec::new()));
        Document {
            nodes: root.body,
            unclosed,
            stray_closers: self.stray_closers,
        }
    }
}

/// Index in `pending` where the head of a block opening at the next `{`
/// starts: a word, optionally called (`stage('x')`) and chained
/// (`docker.image('x').inside`).
fn head_start(pending: &[Token], src: &str) -> usize {
    let mut i = pending.len();
    while i > 0 {
        let token = pending[i - 1];
        match token.kind {
            TokenKind::CloseParen => match matching_open(&pending[..i]) {
                Some(open) => i = open,
                None => break,
            },
            TokenKind::Word => {
                i -= 1;
                if !token.text(src).starts_with('.') {
                    break;
                }
            }
            _ => break,
        }
    }
    i
}

fn matching_open(tokens: &[Token]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().rev() {
        match token.kind {
            TokenKind::CloseParen => depth += 1,
            TokenKind::OpenParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collapses whitespace outside string literals.
fn single_line(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for token in lexer::tokenize(text) {
        match token.kind {
            TokenKind::Space | TokenKind::Newline => {
                if !out.ends_with(' ') {
                    out.push(' ');
                }
            }
            _ => out.push_str(token.text(text)),
        }
    }
    out.trim().to_string()
}

pub fn render_nodes(nodes: &[Node], depth: usize, indent: usize) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Statement(text) => render_statement(text, depth, indent, &mut out),
            Node::Block(block) => render_block(block, depth, indent, &mut out),
        }
    }
    out
}

fn render_statement(text: &str, depth: usize, indent: usize, out: &mut String) {
    out.push_str(&" ".repeat(depth * indent));
    out.push_str(text);
    out.push('\n');
}

fn render_block(block: &Block, depth: usize, indent: usize, out: &mut String) {
    let pad = " ".repeat(depth * indent);
    let open = if block.head.is_empty() {
        "{".to_string()
    } else {
        format!("{} {{", block.head)
    };

    if let [Node::Statement(text)] = block.body.as_slice() {
        let inline = !STRUCTURAL.contains(&block.keyword())
            && !text.contains('\n')
            && !text.contains("//");
        if inline {
            out.push_str(&format!("{pad}{open} {text} }}\n"));
            return;
        }
    }

    out.push_str(&format!("{pad}{open}\n"));
    out.push_str(&render_nodes(&block.body, depth + 1, indent));
    out.push_str(&format!("{pad}}}\n"));
}
