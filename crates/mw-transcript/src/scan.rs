//! Bounded lookahead scanners.
//!
//! Each scanner looks at a window of lines starting at the current position
//! and reports how many lines it consumed along with what it collected. None
//! of them consume a prompt, so the command on it is still seen by the rules.

use std::collections::BTreeSet;

use mw_core::Direction;

use crate::line::Line;
use crate::markup::Channel;
use crate::rules::{self, Event};
use crate::vocab;

/// Lines scanned after a room title.
pub const TITLE_LOOKAHEAD: usize = 50;
/// Lines scanned for an exit list that wraps.
pub const EXIT_LOOKAHEAD: usize = 20;
/// Lines scanned for the output of `look <direction>`.
pub const LOOK_LOOKAHEAD: usize = 20;

/// Result of a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan<T> {
    /// Lines consumed, including the first one the scanner was given.
    pub consumed: usize,
    /// What was collected.
    pub value: T,
}

/// Directions announced by an exit list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitList {
    /// Every announced direction.
    pub directions: BTreeSet<Direction>,
    /// Directions shown as closed doors, e.g. `(east)`.
    pub doors: BTreeSet<Direction>,
}

/// Everything one room display showed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Line number of the title.
    pub line: usize,
    /// Room title.
    pub name: String,
    /// Description lines before the exit list, space-joined.
    pub description: String,
    /// Announced exits.
    pub exits: ExitList,
    /// NPC lines.
    pub npcs: Vec<String>,
    /// Item lines.
    pub items: Vec<String>,
}

/// Collect a room display. `window[0]` must be the title line.
pub fn scan_observation(window: &[Line], cap: usize, exit_cap: usize) -> Scan<Observation> {
    let mut obs = Observation {
        line: window.first().map_or(0, |l| l.number),
        name: window.first().map(|l| l.text.clone()).unwrap_or_default(),
        ..Observation::default()
    };
    let mut description: Vec<&str> = Vec::new();
    let mut seen_exits = false;
    let limit = window.len().min(cap.max(1));
    let mut i = 1;

    while i < limit {
        let line = &window[i];
        if line.is_prompt() || line.channel == Channel::Title {
            break;
        }
        if line.is_blank() {
            i += 1;
            continue;
        }
        if vocab::EXIT_LIST.is_match(&line.text) {
            let scan = scan_exit_list(&window[i..limit], exit_cap);
            obs.exits.directions.extend(scan.value.directions);
            obs.exits.doors.extend(scan.value.doors);
            seen_exits = true;
            i += scan.consumed;
            continue;
        }
        match line.channel {
            // Gray text after the exit list is ambient, not description.
            Channel::Body if !seen_exits => description.push(&line.text),
            Channel::Body => {}
            Channel::Item => obs.items.push(line.text.clone()),
            Channel::Npc => obs.npcs.push(line.text.clone()),
            _ => break,
        }
        i += 1;
    }

    obs.description = description.join(" ");
    Scan {
        consumed: i,
        value: obs,
    }
}

/// Parse an exit list that may wrap over several lines. `window[0]` must start
/// the list.
pub fn scan_exit_list(window: &[Line], cap: usize) -> Scan<ExitList> {
    let mut list = ExitList::default();
    let limit = window.len().min(cap.max(1));
    let mut consumed = 0;

    while consumed < limit {
        let line = &window[consumed];
        if consumed > 0 && (line.is_prompt() || line.channel == Channel::Title) {
            break;
        }
        let (body, closed) = if consumed == 0 {
            match vocab::EXIT_LIST.captures(&line.text) {
                Some(caps) => (
                    caps.get(1).map_or("", |m| m.as_str()).to_string(),
                    caps.get(2).is_some(),
                ),
                None => (String::new(), true),
            }
        } else {
            match line.text.split_once(']') {
                Some((head, _)) => (head.to_string(), true),
                None => (line.text.clone(), false),
            }
        };
        parse_exit_tokens(&body, &mut list);
        consumed += 1;
        if closed {
            break;
        }
    }

    Scan {
        consumed: consumed.max(1),
        value: list,
    }
}

fn parse_exit_tokens(body: &str, list: &mut ExitList) {
    for token in body.split(|c: char| c.is_whitespace() || c == ',') {
        let token = token.trim();
        if token.is_empty() || token.eq_ignore_ascii_case("none") {
            continue;
        }
        let is_door = token.starts_with('(') || token.ends_with(')');
        let bare = token.trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '.'));
        if let Some(dir) = Direction::parse(bare) {
            list.directions.insert(dir);
            if is_door {
                list.doors.insert(dir);
            }
        }
    }
}

/// Collect the output of `look <direction>`. `window` starts on the line after
/// the command. Door messages are part of the look text; any other event ends
/// it.
pub fn scan_look_text(window: &[Line], cap: usize) -> Scan<Option<String>> {
    let limit = window.len().min(cap);
    let mut parts: Vec<&str> = Vec::new();
    let mut consumed = 0;

    while consumed < limit {
        let line = &window[consumed];
        if line.is_prompt() || line.channel == Channel::Title {
            break;
        }
        match rules::classify(line) {
            None | Some((_, Event::Blocked(_))) => {}
            Some(_) => break,
        }
        if !line.is_blank() {
            parts.push(&line.text);
        }
        consumed += 1;
    }

    let text = parts.join(" ");
    let value = if text.is_empty() || vocab::NOTHING_SPECIAL.is_match(&text) {
        None
    } else {
        Some(text)
    };
    Scan { consumed, value }
}
