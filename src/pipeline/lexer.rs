//! Tokenizer for the subset of Groovy found in declarative Jenkinsfiles.
//!
//! The lexer never fails: every byte of the input belongs to exactly one
//! token, so any span can be mapped back to the source text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    /// String literal including its quotes.
    Str,
    /// `// ...` or `/* ... */`.
    Comment,
    /// Identifier-like run, dots included (`env.BRANCH_NAME`).
    Word,
    Newline,
    Space,
    Semicolon,
    Punct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    /// Trivia never carries meaning for the block structure.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Space | TokenKind::Newline | TokenKind::Comment
        )
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '$'
}

pub fn tokenize(src: &str) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        let Some(c) = src[pos..].chars().next() else {
            break;
        };
        let start = pos;
        let kind = match c {
            '{' => {
                pos += 1;
                TokenKind::OpenBrace
            }
            '}' => {
                pos += 1;
                TokenKind::CloseBrace
            }
            '(' => {
                pos += 1;
                TokenKind::OpenParen
            }
            ')' => {
                pos += 1;
                TokenKind::CloseParen
            }
            ';' => {
                pos += 1;
                TokenKind::Semicolon
            }
            '\n' => {
                pos += 1;
                TokenKind::Newline
            }
            '\'' | '"' => {
                pos = scan_string(src, pos, c);
                TokenKind::Str
            }
            '/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = src[pos..].find('\n').map_or(src.len(), |i| pos + i);
                TokenKind::Comment
            }
            '/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = src[pos + 2..].find("*/").map_or(src.len(), |i| pos + 2 + i + 2);
                TokenKind::Comment
            }
            c if c.is_whitespace() => {
                pos = advance_while(src, pos, |c| c.is_whitespace() && c != '\n');
                TokenKind::Space
            }
            c if is_word_char(c) => {
                pos = advance_while(src, pos, is_word_char);
                TokenKind::Word
            }
            c => {
                pos += c.len_utf8();
                TokenKind::Punct
            }
        };
        tokens.push(Token {
            kind,
            start,
            end: pos,
        });
    }

    tokens
}

fn advance_while(src: &str, start: usize, pred: impl Fn(char) -> bool) -> usize {
    src[start..]
        .char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(src.len(), |(i, _)| start + i)
}

/// Returns the end offset of the string literal opening at `start`.
fn scan_string(src: &str, start: usize, quote: char) -> usize {
    let triple: String = std::iter::repeat(quote).take(3).collect();
    if src[start..].starts_with(&triple) {
        let body = start + 3;
        let mut escaped = false;
        for (i, c) in src[body..].char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            if c == '\\' {
                escaped = true;
            } else if src[body + i..].starts_with(&triple) {
                return body + i + 3;
            }
        }
        return src.len();
    }

    let body = start + 1;
    let mut escaped = false;
    for (i, c) in src[body..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\n' => return body + i,
            c if c == quote => return body + i + 1,
            _ => {}
        }
    }
    src.len()
}

/// Content of a string literal token without its quotes.
pub fn string_content(literal: &str) -> &str {
    for delim in ["'''", "\"\"\""] {
        if literal.len() >= 6 && literal.starts_with(delim) && literal.ends_with(delim) {
            return &literal[3..literal.len() - 3];
        }
    }
    let mut chars = literal.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if (open == '\'' || open == '"') && open == close => {
            &literal[1..literal.len() - 1]
        }
        (Some(open), _) if open == '\'' || open == '"' => &literal[1..],
        _ => literal,
    }
}

/// Quotes `text` as a single-quoted Groovy string.
pub fn single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokens_cover_whole_input() {
        let src = "stage('Build') {\n  steps { sh \"make\" } // done\n}";
        let tokens = tokenize(src);
        let rebuilt: String = tokens.iter().map(|t| t.text(src)).collect();
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn test_braces_inside_strings_are_not_structural() {
        use TokenKind::*;
        assert_eq!(
            kinds("sh 'echo }' { \"a{b\" }"),
            vec![Word, Str, OpenBrace, Str, CloseBrace]
        );
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let src = r"sh 'it\'s' }";
        let tokens = tokenize(src);
        assert_eq!(tokens[2].text(src), r"'it\'s'");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::CloseBrace);
    }

    #[test]
    fn test_mixed_quotes_do_not_toggle_each_other() {
        let src = "echo \"it's\" }";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Word, TokenKind::Str, TokenKind::CloseBrace]
        );
    }

    #[test]
    fn test_unterminated_string_stops_at_newline() {
        let src = "sh 'oops\n}";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Word, TokenKind::Str, TokenKind::CloseBrace]
        );
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let src = "sh '''\nif [ x ]; then { echo; }\n''' }";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Word, TokenKind::Str, TokenKind::CloseBrace]
        );
    }

    #[test]
    fn test_comments_hide_braces() {
        assert_eq!(kinds("// {\n/* } */ {"), vec![TokenKind::OpenBrace]);
    }

    #[test]
    fn test_doubled_quotes_lex_as_empty_strings() {
        let src = "bat ''pip''";
        let texts: Vec<&str> = tokenize(src)
            .iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.text(src))
            .collect();
        assert_eq!(texts, vec!["bat", "''", "pip", "''"]);
    }

    #[test]
    fn test_string_content_and_quoting() {
        assert_eq!(string_content("'Build'"), "Build");
        assert_eq!(string_content("\"Test\""), "Test");
        assert_eq!(string_content("'''x'''"), "x");
        assert_eq!(single_quoted("it's"), r"'it\'s'");
    }
}
