//! Exit graph building from movement, blocked movement and look output.

use std::collections::BTreeSet;

use mw_core::{Direction, Exit, MapResult, RoomKey};

use crate::rules::Blockage;
use crate::session::SessionState;
use crate::vocab;

/// What recording a move did to the forward exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Source and destination are the same room; nothing recorded.
    SameRoom,
    /// A new forward exit was created.
    Created,
    /// The exit was already known with this destination.
    Known,
    /// An exit with unknown destination was filled in.
    Filled,
    /// A blocked exit turned out passable.
    Unblocked,
    /// An inferred exit was replaced by what the move showed.
    Corrected,
    /// An observed exit already leads elsewhere; kept as is.
    Conflict,
}

/// Record a confirmed move from `from` to `to` and, where nothing was
/// observed yet, its reverse.
pub fn record_move(
    state: &mut SessionState,
    from: &RoomKey,
    direction: Direction,
    to: &RoomKey,
) -> MapResult<MoveOutcome> {
    if from == to {
        return Ok(MoveOutcome::SameRoom);
    }
    let dest_pk = state.graph.room(to).and_then(|r| r.portal_key.clone());

    let outcome = match state.graph.exit_from_mut(from, direction) {
        None => {
            let mut exit = Exit::new(from.clone(), direction, to.clone());
            exit.portal_key = dest_pk;
            state.graph.add_exit(exit)?;
            state.stats.exits_created += 1;
            MoveOutcome::Created
        }
        Some(exit) if exit.to.as_ref() == Some(to) => {
            exit.inferred = false;
            MoveOutcome::Known
        }
        Some(exit) if exit.blocked || exit.to.is_none() => {
            let outcome = if exit.blocked {
                MoveOutcome::Unblocked
            } else {
                MoveOutcome::Filled
            };
            exit.blocked = false;
            exit.to = Some(to.clone());
            exit.portal_key = dest_pk;
            exit.inferred = false;
            outcome
        }
        Some(exit) if exit.inferred => {
            exit.to = Some(to.clone());
            exit.portal_key = dest_pk;
            exit.inferred = false;
            state.stats.exits_corrected += 1;
            MoveOutcome::Corrected
        }
        Some(exit) => {
            tracing::warn!(
                %from,
                %direction,
                recorded = ?exit.to,
                observed = %to,
                "move contradicts recorded exit; keeping recorded"
            );
            state.stats.exit_conflicts += 1;
            MoveOutcome::Conflict
        }
    };

    if outcome != MoveOutcome::Conflict {
        add_reverse(state, from, direction, to)?;
    }
    Ok(outcome)
}

fn add_reverse(
    state: &mut SessionState,
    from: &RoomKey,
    direction: Direction,
    to: &RoomKey,
) -> MapResult<()> {
    let back = direction.opposite();
    if state.graph.exit_from(to, back).is_some() {
        return Ok(());
    }
    let mut reverse = Exit::new(to.clone(), back, from.clone()).inferred();
    reverse.portal_key = state.graph.room(from).and_then(|r| r.portal_key.clone());
    state.graph.add_exit(reverse)?;
    state.stats.reverse_exits += 1;
    Ok(())
}

/// Record a refused move. Returns whether anything was recorded.
pub fn record_blocked(
    state: &mut SessionState,
    from: &RoomKey,
    direction: Direction,
    blockage: &Blockage,
    message: &str,
) -> MapResult<bool> {
    let (door_name, locked) = match blockage {
        Blockage::NoExit => {
            state.stats.discarded_moves += 1;
            return Ok(false);
        }
        Blockage::Door { name, locked } => (Some(name.clone()), *locked),
        Blockage::Barrier => (None, false),
    };
    let is_door = matches!(blockage, Blockage::Door { .. });

    if let Some(exit) = state.graph.exit_from_mut(from, direction) {
        if is_door {
            exit.is_door = true;
            exit.door_name = door_name.or(exit.door_name.take());
            exit.locked = locked;
        }
        if exit.to.is_none() && !exit.blocked {
            exit.blocked = true;
            state.stats.blocked_exits += 1;
        }
        if exit.description.is_none() {
            exit.description = Some(message.to_string());
        }
        return Ok(true);
    }

    let mut exit = Exit::blocked(from.clone(), direction);
    if is_door {
        exit = exit.with_door(door_name, locked);
    }
    exit.description = Some(message.to_string());
    state.graph.add_exit(exit)?;
    state.stats.blocked_exits += 1;
    Ok(true)
}

/// Attach `look <direction>` text to the matching exit of `from`. Returns
/// whether an exit received it.
pub fn attach_look(
    state: &mut SessionState,
    from: &RoomKey,
    direction: Direction,
    text: Option<String>,
) -> MapResult<bool> {
    let Some(text) = text else {
        return Ok(false);
    };
    let door = vocab::DOOR_NAME
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase());
    let locked = vocab::LOCKED.is_match(&text);

    let declared = state
        .graph
        .room(from)
        .is_some_and(|r| r.exits.contains(&direction));

    match state.graph.exit_from_mut(from, direction) {
        Some(exit) => {
            exit.look_description = Some(text);
            if door.is_some() {
                exit.is_door = true;
                exit.door_name = door;
                exit.locked |= locked;
            }
        }
        None if declared => {
            let mut exit = Exit::unexplored(from.clone(), direction);
            if door.is_some() {
                exit = exit.with_door(door, locked);
            }
            exit.look_description = Some(text);
            state.graph.add_exit(exit)?;
        }
        None => return Ok(false),
    }
    state.stats.exits_described += 1;
    Ok(true)
}

/// Flag recorded exits of `room` that the exit list showed as closed doors.
pub fn note_doors(state: &mut SessionState, room: &RoomKey, doors: &BTreeSet<Direction>) {
    for direction in doors {
        if let Some(exit) = state.graph.exit_from_mut(room, *direction) {
            exit.is_door = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_core::Room;

    fn key(s: &str) -> RoomKey {
        RoomKey::from_raw(s)
    }

    fn state_with(rooms: &[(&str, &[Direction])]) -> SessionState {
        let mut state = SessionState::new();
        for (name, exits) in rooms {
            let room = Room::new(key(name), *name, "").with_exits(exits.iter().copied());
            state.graph.add_room(room).unwrap();
        }
        state
    }

    #[test]
    fn move_adds_forward_and_reverse() {
        let mut state = state_with(&[("a", &[]), ("b", &[])]);
        let out = record_move(&mut state, &key("a"), Direction::South, &key("b")).unwrap();
        assert_eq!(out, MoveOutcome::Created);
        let back = state.graph.exit_from(&key("b"), Direction::North).unwrap();
        assert_eq!(back.to, Some(key("a")));
        assert!(back.inferred);
        assert_eq!(state.graph.exit_count(), 2);
    }

    #[test]
    fn reverse_never_overwrites_observed_exit() {
        let mut state = state_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
        record_move(&mut state, &key("b"), Direction::North, &key("c")).unwrap();
        record_move(&mut state, &key("a"), Direction::South, &key("b")).unwrap();
        let north = state.graph.exit_from(&key("b"), Direction::North).unwrap();
        assert_eq!(north.to, Some(key("c")));
        assert!(!north.inferred);
    }

    #[test]
    fn same_room_records_nothing() {
        let mut state = state_with(&[("a", &[])]);
        let out = record_move(&mut state, &key("a"), Direction::Up, &key("a")).unwrap();
        assert_eq!(out, MoveOutcome::SameRoom);
        assert_eq!(state.graph.exit_count(), 0);
    }

    #[test]
    fn conflicting_move_keeps_observed_exit() {
        let mut state = state_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
        record_move(&mut state, &key("a"), Direction::East, &key("b")).unwrap();
        let out = record_move(&mut state, &key("a"), Direction::East, &key("c")).unwrap();
        assert_eq!(out, MoveOutcome::Conflict);
        assert_eq!(state.stats.exit_conflicts, 1);
        assert_eq!(
            state.graph.exit_from(&key("a"), Direction::East).unwrap().to,
            Some(key("b"))
        );
        assert!(state.graph.exit_from(&key("c"), Direction::West).is_none());
    }

    #[test]
    fn inferred_exit_is_corrected_by_observation() {
        let mut state = state_with(&[("a", &[]), ("b", &[]), ("c", &[])]);
        record_move(&mut state, &key("a"), Direction::South, &key("b")).unwrap();
        let out = record_move(&mut state, &key("b"), Direction::North, &key("c")).unwrap();
        assert_eq!(out, MoveOutcome::Corrected);
        let north = state.graph.exit_from(&key("b"), Direction::North).unwrap();
        assert_eq!(north.to, Some(key("c")));
        assert!(!north.inferred);
    }

    #[test]
    fn blocked_by_door_then_opened() {
        let mut state = state_with(&[("a", &[]), ("b", &[])]);
        let blockage = Blockage::Door {
            name: "oak door".into(),
            locked: true,
        };
        assert!(
            record_blocked(&mut state, &key("a"), Direction::West, &blockage, "The oak door is locked.")
                .unwrap()
        );
        let exit = state.graph.exit_from(&key("a"), Direction::West).unwrap();
        assert!(exit.blocked && exit.is_door && exit.locked);
        assert_eq!(exit.to, None);

        let out = record_move(&mut state, &key("a"), Direction::West, &key("b")).unwrap();
        assert_eq!(out, MoveOutcome::Unblocked);
        let exit = state.graph.exit_from(&key("a"), Direction::West).unwrap();
        assert!(!exit.blocked);
        assert_eq!(exit.door_name.as_deref(), Some("oak door"));
    }

    #[test]
    fn no_exit_is_discarded() {
        let mut state = state_with(&[("a", &[])]);
        let recorded = record_blocked(
            &mut state,
            &key("a"),
            Direction::North,
            &Blockage::NoExit,
            "Alas, you cannot go that way.",
        )
        .unwrap();
        assert!(!recorded);
        assert_eq!(state.graph.exit_count(), 0);
        assert_eq!(state.stats.discarded_moves, 1);
    }

    #[test]
    fn look_text_on_declared_direction_creates_unexplored_exit() {
        let mut state = state_with(&[("a", &[Direction::Down])]);
        let attached = attach_look(
            &mut state,
            &key("a"),
            Direction::Down,
            Some("The trapdoor is locked.".into()),
        )
        .unwrap();
        assert!(attached);
        let exit = state.graph.exit_from(&key("a"), Direction::Down).unwrap();
        assert_eq!(exit.to, None);
        assert!(!exit.blocked);
        assert!(exit.is_door && exit.locked);
        assert_eq!(exit.door_name.as_deref(), Some("trapdoor"));
    }

    #[test]
    fn look_text_on_undeclared_direction_is_dropped() {
        let mut state = state_with(&[("a", &[])]);
        let attached =
            attach_look(&mut state, &key("a"), Direction::Up, Some("Sky.".into())).unwrap();
        assert!(!attached);
        assert_eq!(state.graph.exit_count(), 0);
    }
}
