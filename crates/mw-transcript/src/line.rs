//! A transcript line after markup stripping.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::{self, Channel};

static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<[^<>]*>\s*(.*)$").expect("prompt pattern"));

/// One classified transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in the transcript.
    pub number: usize,
    /// Visible text.
    pub text: String,
    /// Semantic channel.
    pub channel: Channel,
    /// For prompt lines, the command echoed after the prompt (possibly empty).
    pub command: Option<String>,
}

impl Line {
    /// Strip and classify a raw log line.
    pub fn parse(number: usize, raw: &str) -> Self {
        let styled = markup::strip(raw);
        // Some clients colour the prompt; room channels never carry one.
        let command = if matches!(styled.channel, Channel::Plain | Channel::Other) {
            PROMPT
                .captures(&styled.text)
                .map(|c| c.get(1).map_or("", |m| m.as_str()).trim().to_string())
        } else {
            None
        };
        Self {
            number,
            text: styled.text,
            channel: styled.channel,
            command,
        }
    }

    /// Split a whole transcript into lines.
    pub fn parse_all(transcript: &str) -> Vec<Self> {
        transcript
            .lines()
            .enumerate()
            .map(|(i, raw)| Self::parse(i + 1, raw))
            .collect()
    }

    /// Whether this line is a prompt, i.e. the end of an output block.
    pub fn is_prompt(&self) -> bool {
        self.command.is_some()
    }

    /// Whether the line has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coloured_prompt_keeps_its_command() {
        let line = Line::parse(1, r#"<span class="white">&lt;100hp&gt;</span> n"#);
        assert_eq!(line.channel, Channel::Other);
        assert_eq!(line.command.as_deref(), Some("n"));
    }

    #[test]
    fn prompt_with_command() {
        let line = Line::parse(3, "<100hp 50mv> south");
        assert!(line.is_prompt());
        assert_eq!(line.command.as_deref(), Some("south"));
        assert_eq!(line.number, 3);
    }

    #[test]
    fn bare_prompt_has_empty_command() {
        let line = Line::parse(1, "&lt;100hp 50mv&gt;");
        assert_eq!(line.command.as_deref(), Some(""));
    }

    #[test]
    fn coloured_text_is_not_a_prompt() {
        let line = Line::parse(1, r#"<span class="gray">&lt;carved runes&gt;</span>"#);
        assert!(!line.is_prompt());
        assert_eq!(line.channel, Channel::Body);
    }

    #[test]
    fn parse_all_numbers_from_one() {
        let lines = Line::parse_all("a\nb\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].number, 2);
    }
}
