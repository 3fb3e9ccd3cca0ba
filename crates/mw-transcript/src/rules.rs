//! The ordered rule table that turns a line into at most one event.
//!
//! Rules are tried top to bottom and the first match wins. The order is part
//! of the contract: a portal result must win over anything else on the line,
//! and a room title is only considered once every literal phrase has failed.

use mw_core::Direction;

use crate::line::Line;
use crate::markup::Channel;
use crate::vocab;

/// Why a bind attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindFailure {
    /// The room can never be bound.
    Permanent,
    /// Concentration was lost; may work on retry.
    Transient,
}

/// Why a movement did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blockage {
    /// No exit that way. Nothing is recorded.
    NoExit,
    /// A door is in the way.
    Door {
        /// Door name as printed.
        name: String,
        /// The door is locked, not merely closed.
        locked: bool,
    },
    /// Some other barrier is in the way.
    Barrier,
}

/// A semantic event recognised on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A portal bind succeeded and revealed the room's key.
    PortalKey(String),
    /// A portal bind failed.
    BindFailed(BindFailure),
    /// The player started a portal bind.
    BindAttempt,
    /// The player looked in a direction.
    LookDirection(Direction),
    /// The game reported the current zone.
    ZoneBanner(String),
    /// The character died.
    Death,
    /// The character came back to life.
    Respawn,
    /// The player looked at the room.
    Look,
    /// The player walked in a direction.
    Move(Direction),
    /// The player fled in a direction.
    Flee(Direction),
    /// A movement was refused.
    Blocked(Blockage),
    /// A room title started an observation block.
    RoomTitle(String),
}

/// One entry of the rule table.
pub struct Rule {
    /// Short name, used in logs.
    pub name: &'static str,
    /// Returns the event when the rule matches.
    pub matcher: fn(&Line) -> Option<Event>,
}

/// The rule table, in precedence order.
pub const RULES: &[Rule] = &[
    Rule { name: "portal-key", matcher: portal_key },
    Rule { name: "bind-failed-permanent", matcher: bind_failed_permanent },
    Rule { name: "bind-failed-transient", matcher: bind_failed_transient },
    Rule { name: "bind-attempt", matcher: bind_attempt },
    Rule { name: "look-direction", matcher: look_direction },
    Rule { name: "zone-banner", matcher: zone_banner },
    Rule { name: "death", matcher: death },
    Rule { name: "respawn", matcher: respawn },
    Rule { name: "look", matcher: look },
    Rule { name: "move", matcher: movement },
    Rule { name: "flee", matcher: flee },
    Rule { name: "blocked", matcher: blocked },
    Rule { name: "room-title", matcher: room_title },
];

/// Run the rule table over a line.
pub fn classify(line: &Line) -> Option<(&'static str, Event)> {
    RULES
        .iter()
        .find_map(|rule| (rule.matcher)(line).map(|event| (rule.name, event)))
}

/// Text of a non-prompt line.
fn output(line: &Line) -> Option<&str> {
    if line.is_prompt() || line.is_blank() {
        None
    } else {
        Some(line.text.as_str())
    }
}

/// Command echoed on a prompt line.
fn command(line: &Line) -> Option<&str> {
    line.command.as_deref().filter(|c| !c.is_empty())
}

fn portal_key(line: &Line) -> Option<Event> {
    let caps = vocab::PORTAL_KEY.captures(output(line)?)?;
    let key = caps.get(1).or_else(|| caps.get(2))?;
    Some(Event::PortalKey(key.as_str().to_string()))
}

fn bind_failed_permanent(line: &Line) -> Option<Event> {
    vocab::BIND_FAILED_PERMANENT
        .is_match(output(line)?)
        .then_some(Event::BindFailed(BindFailure::Permanent))
}

fn bind_failed_transient(line: &Line) -> Option<Event> {
    vocab::BIND_FAILED_TRANSIENT
        .is_match(output(line)?)
        .then_some(Event::BindFailed(BindFailure::Transient))
}

fn bind_attempt(line: &Line) -> Option<Event> {
    vocab::BIND_ATTEMPT
        .is_match(command(line)?)
        .then_some(Event::BindAttempt)
}

fn look_direction(line: &Line) -> Option<Event> {
    let caps = vocab::LOOK_DIRECTION.captures(command(line)?)?;
    Direction::parse(caps.get(1)?.as_str()).map(Event::LookDirection)
}

fn zone_banner(line: &Line) -> Option<Event> {
    let text = output(line)?;
    vocab::ZONE_BANNERS
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| Event::ZoneBanner(m.as_str().trim().to_string()))
}

fn death(line: &Line) -> Option<Event> {
    vocab::DEATH.is_match(output(line)?).then_some(Event::Death)
}

fn respawn(line: &Line) -> Option<Event> {
    vocab::RESPAWN.is_match(output(line)?).then_some(Event::Respawn)
}

fn look(line: &Line) -> Option<Event> {
    vocab::LOOK.is_match(command(line)?).then_some(Event::Look)
}

fn movement(line: &Line) -> Option<Event> {
    let cmd = command(line)?;
    if cmd.split_whitespace().count() != 1 {
        return None;
    }
    Direction::parse(cmd).map(Event::Move)
}

fn flee(line: &Line) -> Option<Event> {
    let caps = vocab::FLEE.captures(command(line)?)?;
    Direction::parse(caps.get(1)?.as_str()).map(Event::Flee)
}

fn blocked(line: &Line) -> Option<Event> {
    let text = output(line)?;
    if vocab::NO_EXIT.is_match(text) {
        return Some(Event::Blocked(Blockage::NoExit));
    }
    if let Some(caps) = vocab::CLOSED_DOOR.captures(text) {
        let name = caps.get(1)?.as_str().to_lowercase();
        let locked = caps.get(2)?.as_str().eq_ignore_ascii_case("locked");
        return Some(Event::Blocked(Blockage::Door { name, locked }));
    }
    vocab::BARRIER
        .is_match(text)
        .then_some(Event::Blocked(Blockage::Barrier))
}

fn room_title(line: &Line) -> Option<Event> {
    if line.channel != Channel::Title {
        return None;
    }
    output(line).map(|t| Event::RoomTitle(t.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(raw: &str) -> Option<Event> {
        classify(&Line::parse(1, raw)).map(|(_, e)| e)
    }

    #[test]
    fn commands_on_prompt_lines() {
        assert_eq!(event("<20hp> s"), Some(Event::Move(Direction::South)));
        assert_eq!(event("<20hp> flee west"), Some(Event::Flee(Direction::West)));
        assert_eq!(event("<20hp> look"), Some(Event::Look));
        assert_eq!(
            event("<20hp> l north"),
            Some(Event::LookDirection(Direction::North))
        );
        assert_eq!(event("<20hp> cast 'bind portal'"), Some(Event::BindAttempt));
        assert_eq!(event("<20hp> say hello"), None);
        assert_eq!(event("<20hp>"), None);
    }

    #[test]
    fn direction_words_in_output_are_not_moves() {
        assert_eq!(event("north"), None);
    }

    #[test]
    fn look_at_non_direction_is_ignored() {
        assert_eq!(event("<20hp> look sword"), None);
    }

    #[test]
    fn portal_result_wins_over_title_channel() {
        let raw = r#"<span class="cyan">Portal key: zz9</span>"#;
        assert_eq!(event(raw), Some(Event::PortalKey("zz9".into())));
    }

    #[test]
    fn failures_distinguished() {
        assert_eq!(
            event("Something prevents you from binding a portal here."),
            Some(Event::BindFailed(BindFailure::Permanent))
        );
        assert_eq!(
            event("You lost your concentration!"),
            Some(Event::BindFailed(BindFailure::Transient))
        );
    }

    #[test]
    fn blocked_kinds() {
        assert_eq!(
            event("Alas, you cannot go that way."),
            Some(Event::Blocked(Blockage::NoExit))
        );
        assert_eq!(
            event("The wooden door is closed."),
            Some(Event::Blocked(Blockage::Door {
                name: "wooden door".into(),
                locked: false
            }))
        );
        assert_eq!(
            event("A magical barrier blocks your way."),
            Some(Event::Blocked(Blockage::Barrier))
        );
    }

    #[test]
    fn banners() {
        assert_eq!(
            event("You are in the zone: Midgaard."),
            Some(Event::ZoneBanner("Midgaard".into()))
        );
        assert_eq!(event("You are DEAD!"), Some(Event::Death));
        assert_eq!(event("You awaken in the temple."), Some(Event::Respawn));
    }

    #[test]
    fn cyan_line_is_title_and_gray_is_not() {
        assert_eq!(
            event(r#"<span class="cyan">Market Square</span>"#),
            Some(Event::RoomTitle("Market Square".into()))
        );
        assert_eq!(event(r#"<span class="gray">Market Square</span>"#), None);
    }

    #[test]
    fn table_order_is_fixed() {
        let names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"portal-key"));
        assert_eq!(names.last(), Some(&"room-title"));
        assert_eq!(names.len(), 13);
    }
}
