use console::{style, StyledObject};
use std::fmt::Display;

/// What a piece of terminal text means to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Brand,
    Heading,
    Muted,
    Clean,
    Problem,
    Failure,
}

pub fn paint(tone: Tone, text: impl Display) -> StyledObject<String> {
    let styled = style(text.to_string());
    match tone {
        Tone::Brand => styled.magenta().bold(),
        Tone::Heading => styled.bright().underlined(),
        Tone::Muted => styled.dim(),
        Tone::Clean => styled.bright().green(),
        Tone::Problem => styled.bright().yellow(),
        Tone::Failure => styled.bright().red(),
    }
}

pub fn section_heading(emoji: &str, title: &str) -> String {
    format!("{} {}", style(emoji).bright(), paint(Tone::Heading, title))
}

/// Headline for a validator run with `problems` findings.
pub fn verdict(problems: usize) -> StyledObject<String> {
    if problems == 0 {
        paint(Tone::Clean, "✔ No structural problems found")
    } else {
        paint(
            Tone::Problem,
            format!("⚠ {problems} structural problem(s) found"),
        )
    }
}

pub fn failure_mark() -> StyledObject<String> {
    paint(Tone::Failure, "✖")
}
