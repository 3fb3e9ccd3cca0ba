//! Markup stripping for client log lines.
//!
//! Logs are HTML-flavoured: colour comes from `<span class="...">`,
//! `<span style="color: ...">` or `<font color="...">`, and the colour of the
//! first visible text decides which semantic channel the line belongs to.

use std::fmt;
use std::sync::LazyLock;

use logos::Logos;
use regex::Regex;

/// Semantic channel of a line, carried by its colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Room title (cyan).
    Title,
    /// Exit list (teal).
    Exits,
    /// Description or ambient text (gray).
    Body,
    /// Item lying in the room (green).
    Item,
    /// NPC present in the room (olive).
    Npc,
    /// Some other colour.
    Other,
    /// No colour at all.
    Plain,
}

impl Channel {
    /// Map a colour name, hex code or `rgb(...)` value to a channel.
    pub fn from_color(color: &str) -> Self {
        let color = color.trim().to_lowercase();
        let color = rgb_to_hex(&color).unwrap_or(color);
        match color.as_str() {
            "cyan" | "aqua" | "#00ffff" | "#0ff" => Self::Title,
            "teal" | "#008080" => Self::Exits,
            "gray" | "grey" | "silver" | "#808080" | "#c0c0c0" => Self::Body,
            "green" | "lime" | "#008000" | "#00ff00" => Self::Item,
            "olive" | "#808000" => Self::Npc,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Exits => "exits",
            Self::Body => "body",
            Self::Item => "item",
            Self::Npc => "npc",
            Self::Other => "other",
            Self::Plain => "plain",
        };
        f.write_str(name)
    }
}

fn rgb_to_hex(color: &str) -> Option<String> {
    let inner = color.strip_prefix("rgb(")?.strip_suffix(')')?;
    let parts: Vec<u8> = inner
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(format!("#{r:02x}{g:02x}{b:02x}")),
        _ => None,
    }
}

static COLOR_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:class|color)\s*[:=]\s*["']?\s*(rgb\([^)]*\)|#?[a-z0-9]+)"#)
        .unwrap_or_else(|e| panic!("colour attribute pattern: {e}"))
});

/// Raw markup token. Tag names are matched lower-case, as clients write them.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Markup {
    #[regex(r"<span[^>]*>")]
    SpanOpen,

    #[regex(r"<font[^>]*>")]
    FontOpen,

    #[token("</span>")]
    #[token("</font>")]
    Close,

    #[regex(r"</?(br|b|i|u|p|pre|div|html|head|body|meta|title|style|tt|strong|em)(\s[^>]*)?/?>")]
    Structural,

    #[regex(r"&#[0-9]+;")]
    NumericEntity,

    #[regex(r"&[a-zA-Z]+;")]
    NamedEntity,

    #[regex(r"[^<&]+")]
    Text,

    #[token("<")]
    Lt,

    #[token("&")]
    Amp,
}

/// A line with markup removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    /// Visible text, trimmed.
    pub text: String,
    /// Channel of the first visible text run.
    pub channel: Channel,
}

/// Strip markup from one log line, decode entities, and find its channel.
pub fn strip(raw: &str) -> StyledText {
    let mut lexer = Markup::lexer(raw);
    let mut colors: Vec<Channel> = Vec::new();
    let mut text = String::with_capacity(raw.len());
    let mut channel: Option<Channel> = None;

    while let Some(token) = lexer.next() {
        let slice = lexer.slice();
        let visible: Option<std::borrow::Cow<'_, str>> = match token {
            Ok(Markup::SpanOpen | Markup::FontOpen) => {
                let color = COLOR_ATTR
                    .captures(slice)
                    .and_then(|c| c.get(1))
                    .map_or(Channel::Other, |m| Channel::from_color(m.as_str()));
                colors.push(color);
                None
            }
            Ok(Markup::Close) => {
                colors.pop();
                None
            }
            Ok(Markup::Structural) => None,
            Ok(Markup::NumericEntity) => slice[2..slice.len() - 1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(|c| c.to_string().into()),
            Ok(Markup::NamedEntity) => Some(decode_named(slice).into()),
            Ok(Markup::Text | Markup::Lt | Markup::Amp) | Err(()) => Some(slice.into()),
        };

        if let Some(visible) = visible {
            if channel.is_none() && !visible.trim().is_empty() {
                channel = Some(colors.last().copied().unwrap_or(Channel::Plain));
            }
            text.push_str(&visible);
        }
    }

    StyledText {
        text: text.trim().to_string(),
        channel: channel.unwrap_or(Channel::Plain),
    }
}

fn decode_named(entity: &str) -> String {
    match entity {
        "&lt;" => "<".into(),
        "&gt;" => ">".into(),
        "&amp;" => "&".into(),
        "&quot;" => "\"".into(),
        "&apos;" | "&#39;" => "'".into(),
        "&nbsp;" => " ".into(),
        other => other.into(),
    }
}
