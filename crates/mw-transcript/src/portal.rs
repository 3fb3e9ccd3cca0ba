//! Portal bind attempts and their delayed results.
//!
//! A bind is attempted in one room and its result may print many lines later,
//! after the player has walked on. The attempt room is kept in the session
//! until a result or failure consumes it.

use std::collections::HashSet;

use mw_core::{MapResult, Room, RoomKey, RoomLookup};

use crate::config::EngineConfig;
use crate::rules::BindFailure;
use crate::session::{SessionState, Sighting};

/// What a portal key result did to the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// The attempt room already held this key.
    Confirmed(RoomKey),
    /// The attempt room was renamed to its portal-derived key.
    Promoted {
        /// Key before the rename.
        from: RoomKey,
        /// Portal-derived key.
        to: RoomKey,
    },
    /// The attempt room was a duplicate and was folded into its twin.
    Merged {
        /// Deleted duplicate.
        from: RoomKey,
        /// Surviving room.
        into: RoomKey,
    },
    /// The attempt room had been misidentified; the player was really in `actual`.
    Misidentified {
        /// Room the engine believed the player was in.
        believed: RoomKey,
        /// Room the portal key proves.
        actual: RoomKey,
    },
    /// No attempt room was known; the room was placed from the remote store
    /// or the local map.
    Bootstrapped(RoomKey),
    /// No attempt room was known and nothing else placed the key.
    Unplaced,
}

/// A bind command was issued.
pub fn on_bind_attempt(state: &mut SessionState) {
    let Some(current) = state.current.clone() else {
        tracing::debug!("bind attempt with unknown position ignored");
        return;
    };
    if state.no_magic.contains(&current) {
        tracing::debug!(room = %current, "bind attempt in no-magic room ignored");
        return;
    }
    state.stats.bind_attempts += 1;
    state.pending_bind = Some(current);
}

/// A bind attempt failed.
///
/// Lost concentration is printed for any failed spell, so it only counts
/// against a pending bind attempt. The permanent phrases name binding and fall
/// back to the current room.
pub fn on_bind_failure(state: &mut SessionState, failure: BindFailure, config: &EngineConfig) {
    let room = match failure {
        BindFailure::Permanent => state.pending_bind.take().or_else(|| state.current.clone()),
        BindFailure::Transient => state.pending_bind.take(),
    };
    let Some(room) = room else {
        tracing::trace!(?failure, "spell failure with no bind attempt pending");
        return;
    };
    state.stats.bind_failures += 1;
    match failure {
        BindFailure::Permanent => {
            tracing::info!(%room, "room is no-magic");
            state.mark_no_magic(&room);
        }
        BindFailure::Transient => {
            let count = state.bind_failures.entry(room.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            tracing::debug!(%room, count, "bind lost concentration");
            if count >= config.transient_failure_limit {
                tracing::info!(%room, count, "repeated bind failures; room is no-magic");
                state.mark_no_magic(&room);
            }
        }
    }
}

/// A bind succeeded and printed `portal_key`.
pub fn on_portal_key(
    state: &mut SessionState,
    portal_key: &str,
    lookup: Option<&dyn RoomLookup>,
) -> MapResult<BindOutcome> {
    let attempt = state
        .pending_bind
        .take()
        .or_else(|| state.current.clone())
        .filter(|k| state.graph.contains_room(k));
    let Some(attempt) = attempt else {
        return bootstrap(state, portal_key, lookup);
    };

    let holder = state
        .graph
        .find_by_portal_key(portal_key)
        .map(|r| r.key.clone());
    let outcome = match holder {
        Some(holder) if holder == attempt => BindOutcome::Confirmed(holder),
        Some(holder) => {
            let twin = match (state.graph.room(&attempt), state.graph.room(&holder)) {
                (Some(a), Some(h)) => a.portal_key.is_none() && a.same_text(&h.name, &h.description),
                _ => false,
            };
            if twin {
                state.merge_room(&attempt, &holder)?;
                state.stats.merges += 1;
                tracing::info!(from = %attempt, into = %holder, "merged duplicate room");
                BindOutcome::Merged {
                    from: attempt,
                    into: holder,
                }
            } else {
                recover_misidentified(state, &attempt, holder)
            }
        }
        None => {
            let held = state
                .graph
                .room(&attempt)
                .and_then(|r| r.portal_key.clone());
            match held {
                Some(other) => {
                    tracing::warn!(
                        room = %attempt,
                        held = %other,
                        got = portal_key,
                        "room already holds another portal key"
                    );
                    let actual = split_identity(state, &attempt, portal_key)?;
                    recover_misidentified(state, &attempt, actual)
                }
                None => {
                    state.graph.bind_portal_key(&attempt, portal_key)?;
                    let promoted = RoomKey::portal(portal_key);
                    state.rename_room(&attempt, promoted.clone())?;
                    state.stats.promotions += 1;
                    tracing::info!(from = %attempt, to = %promoted, "promoted room");
                    BindOutcome::Promoted {
                        from: attempt,
                        to: promoted,
                    }
                }
            }
        }
    };

    clear_failures(state, &outcome);
    Ok(outcome)
}

fn clear_failures(state: &mut SessionState, outcome: &BindOutcome) {
    let room = match outcome {
        BindOutcome::Confirmed(k) | BindOutcome::Bootstrapped(k) => k,
        BindOutcome::Promoted { to, .. } => to,
        BindOutcome::Merged { into, .. } => into,
        BindOutcome::Misidentified { actual, .. } => actual,
        BindOutcome::Unplaced => return,
    };
    state.bind_failures.remove(room);
    if state.no_magic.remove(room) {
        tracing::info!(%room, "portal bound in a room marked no-magic; clearing flag");
    }
    if let Some(r) = state.graph.room_mut(room) {
        r.no_magic = false;
    }
}

/// Create the room a portal key proves from what the latest entry into the
/// misidentified room showed.
fn split_identity(state: &mut SessionState, believed: &RoomKey, portal_key: &str) -> MapResult<RoomKey> {
    let key = RoomKey::portal(portal_key);
    let mut room = match state.graph.room(believed) {
        Some(b) => {
            let mut r = Room::new(key.clone(), b.name.clone(), b.description.clone());
            r.terrain = b.terrain.clone();
            match state.last_visit(believed) {
                Some(visit) => visit.seen.merge_into(&mut r),
                None => Sighting::of(b).merge_into(&mut r),
            }
            r
        }
        None => Room::new(key.clone(), "", ""),
    };
    room.portal_key = Some(portal_key.to_string());
    state.graph.add_room(room)?;
    state.stats.rooms_created += 1;
    Ok(key)
}

/// Undo what was recorded since the believed room was last entered and move
/// the position to the proven room.
///
/// Exits created after the believed room was entered that connect it to a room
/// without a portal key are removed. This is a heuristic: it can remove an edge
/// that was right or keep one that was wrong. What that entry unioned into the
/// believed room is taken back out and credited to the proven room.
fn recover_misidentified(state: &mut SessionState, believed: &RoomKey, actual: RoomKey) -> BindOutcome {
    let since = state.entered_at(believed);
    let unkeyed: HashSet<RoomKey> = state
        .graph
        .rooms()
        .filter(|r| r.portal_key.is_none())
        .map(|r| r.key.clone())
        .collect();
    let removed = state.graph.remove_exits_where(|e| {
        if e.id.0 <= since || !e.touches(believed) {
            return false;
        }
        let neighbour = if &e.from == believed {
            e.to.as_ref()
        } else {
            Some(&e.from)
        };
        neighbour.is_some_and(|n| n != believed && unkeyed.contains(n))
    });

    if let Some(visit) = state.take_visit(believed) {
        if let (Some(before), Some(room)) = (visit.before, state.graph.room_mut(believed)) {
            before.restore(room);
        }
        if let Some(room) = state.graph.room_mut(&actual) {
            visit.seen.merge_into(room);
        }
    }

    state.stats.misidentifications += 1;
    state.stats.exits_rolled_back += removed.len() as u64;
    tracing::warn!(
        believed = %believed,
        actual = %actual,
        removed = removed.len(),
        "room was misidentified"
    );

    if state.current.as_ref() == Some(believed) {
        state.enter(actual.clone());
    }
    BindOutcome::Misidentified {
        believed: believed.clone(),
        actual,
    }
}

fn bootstrap(
    state: &mut SessionState,
    portal_key: &str,
    lookup: Option<&dyn RoomLookup>,
) -> MapResult<BindOutcome> {
    if let Some(known) = state.graph.find_by_portal_key(portal_key) {
        let key = known.key.clone();
        state.enter(key.clone());
        return Ok(BindOutcome::Bootstrapped(key));
    }
    let remote = lookup
        .map(|l| l.rooms_by_portal_key(portal_key))
        .unwrap_or_default();
    let Some(found) = remote.into_iter().next() else {
        tracing::warn!(portal_key, "portal key with no bind attempt and no known room");
        return Ok(BindOutcome::Unplaced);
    };

    let key = RoomKey::portal(portal_key);
    let mut room = Room::new(key.clone(), found.name, found.description);
    room.portal_key = Some(portal_key.to_string());
    room.zone_id = found.zone_id;
    state.graph.add_room(room)?;
    state.stats.bootstrapped_rooms += 1;
    state.stats.rooms_created += 1;
    tracing::info!(room = %key, remote_id = found.id, "bootstrapped room from store");
    state.enter(key.clone());
    Ok(BindOutcome::Bootstrapped(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Visit;
    use mw_core::{Direction, Exit, KnownRoom};

    fn key(s: &str) -> RoomKey {
        RoomKey::from_raw(s)
    }

    fn add(state: &mut SessionState, k: &str, name: &str, pk: Option<&str>) {
        let mut room = Room::new(key(k), name, "Same.");
        room.portal_key = pk.map(str::to_string);
        state.graph.add_room(room).unwrap();
    }

    struct Remote;

    impl RoomLookup for Remote {
        fn rooms_by_portal_key(&self, portal_key: &str) -> Vec<KnownRoom> {
            if portal_key == "home" {
                vec![KnownRoom {
                    id: 9,
                    name: "Temple".into(),
                    description: "Holy.".into(),
                    portal_key: Some("home".into()),
                    zone_id: Some(3),
                }]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn promotion_renames_attempt_room() {
        let mut state = SessionState::new();
        add(&mut state, "x", "Hall", None);
        state.enter(key("x"));
        on_bind_attempt(&mut state);

        let out = on_portal_key(&mut state, "k1", None).unwrap();
        assert_eq!(
            out,
            BindOutcome::Promoted {
                from: key("x"),
                to: RoomKey::portal("k1")
            }
        );
        assert_eq!(state.current, Some(RoomKey::portal("k1")));
        assert!(state.pending_bind.is_none());
    }

    #[test]
    fn repeat_result_is_idempotent() {
        let mut state = SessionState::new();
        add(&mut state, "pk:k1", "Hall", Some("k1"));
        state.enter(RoomKey::portal("k1"));
        on_bind_attempt(&mut state);
        let out = on_portal_key(&mut state, "k1", None).unwrap();
        assert_eq!(out, BindOutcome::Confirmed(RoomKey::portal("k1")));
        assert_eq!(state.graph.room_count(), 1);
    }

    #[test]
    fn misidentified_room_loses_recent_exits() {
        let mut state = SessionState::new();
        add(&mut state, "pk:a", "Maze", Some("a"));
        add(&mut state, "pk:b", "Maze", Some("b"));
        add(&mut state, "n", "Nook", None);
        state.enter(key("pk:a"));
        state
            .graph
            .add_exit(Exit::new(key("pk:a"), Direction::East, key("n")))
            .unwrap();
        on_bind_attempt(&mut state);

        let out = on_portal_key(&mut state, "b", None).unwrap();
        assert_eq!(
            out,
            BindOutcome::Misidentified {
                believed: key("pk:a"),
                actual: key("pk:b")
            }
        );
        assert_eq!(state.graph.exit_count(), 0);
        assert_eq!(state.current, Some(key("pk:b")));
        assert_eq!(state.stats.exits_rolled_back, 1);
    }

    #[test]
    fn misidentification_takes_back_the_wrong_union() {
        let mut state = SessionState::new();
        add(&mut state, "pk:a", "Maze", Some("a"));
        let north: std::collections::BTreeSet<_> = [Direction::North].into_iter().collect();
        state.graph.room_mut(&key("pk:a")).unwrap().exits = north.clone();

        let seen = Sighting {
            exits: [Direction::West].into_iter().collect(),
            npcs: vec!["a minotaur".into()],
            ..Sighting::default()
        };
        let before = Sighting::of(state.graph.room(&key("pk:a")).unwrap());
        seen.merge_into(state.graph.room_mut(&key("pk:a")).unwrap());
        state.enter(key("pk:a"));
        state.record_visit(
            &key("pk:a"),
            Visit {
                seen: seen.clone(),
                before: Some(before),
            },
        );
        on_bind_attempt(&mut state);
        on_portal_key(&mut state, "b", None).unwrap();

        let believed = state.graph.room(&key("pk:a")).unwrap();
        assert_eq!(believed.exits, north);
        assert!(believed.npcs.is_empty());
        let actual = state.graph.find_by_portal_key("b").unwrap();
        assert_eq!(Sighting::of(actual), seen);
        assert!(state.last_visit(&key("pk:a")).is_none());
    }

    #[test]
    fn misidentification_after_walking_on_keeps_position() {
        let mut state = SessionState::new();
        add(&mut state, "pk:a", "Maze", Some("a"));
        add(&mut state, "pk:b", "Maze", Some("b"));
        add(&mut state, "n", "Nook", None);
        state.enter(key("pk:a"));
        on_bind_attempt(&mut state);
        state.enter(key("n"));

        let out = on_portal_key(&mut state, "b", None).unwrap();
        assert!(matches!(out, BindOutcome::Misidentified { .. }));
        assert_eq!(state.current, Some(key("n")));
    }

    #[test]
    fn second_key_for_keyed_room_splits_identity() {
        let mut state = SessionState::new();
        add(&mut state, "pk:a", "Maze", Some("a"));
        state.enter(key("pk:a"));
        on_bind_attempt(&mut state);

        let out = on_portal_key(&mut state, "c", None).unwrap();
        assert!(matches!(out, BindOutcome::Misidentified { .. }));
        let split = state.graph.find_by_portal_key("c").unwrap();
        assert_eq!(split.name, "Maze");
        assert_eq!(state.current, Some(RoomKey::portal("c")));
        assert_eq!(state.graph.find_by_portal_key("a").unwrap().key, key("pk:a"));
    }

    #[test]
    fn transient_failures_escalate() {
        let mut state = SessionState::new();
        add(&mut state, "x", "Hall", None);
        state.enter(key("x"));
        let cfg = EngineConfig::default();
        for _ in 0..2 {
            on_bind_attempt(&mut state);
            on_bind_failure(&mut state, BindFailure::Transient, &cfg);
        }
        assert!(!state.no_magic.contains(&key("x")));
        on_bind_attempt(&mut state);
        on_bind_failure(&mut state, BindFailure::Transient, &cfg);
        assert!(state.no_magic.contains(&key("x")));

        on_bind_attempt(&mut state);
        assert!(state.pending_bind.is_none());
        assert_eq!(state.stats.bind_attempts, 3);
    }

    #[test]
    fn spell_failure_without_bind_attempt_is_ignored() {
        let mut state = SessionState::new();
        add(&mut state, "x", "Arena", None);
        state.enter(key("x"));
        let cfg = EngineConfig::default();
        for _ in 0..5 {
            on_bind_failure(&mut state, BindFailure::Transient, &cfg);
        }
        assert!(state.no_magic.is_empty());
        assert!(state.bind_failures.is_empty());
        assert_eq!(state.stats.bind_failures, 0);
    }

    #[test]
    fn unplaced_key_bootstraps_from_lookup() {
        let mut state = SessionState::new();
        let out = on_portal_key(&mut state, "home", Some(&Remote)).unwrap();
        assert_eq!(out, BindOutcome::Bootstrapped(RoomKey::portal("home")));
        let room = state.graph.room(&RoomKey::portal("home")).unwrap();
        assert_eq!(room.name, "Temple");
        assert_eq!(room.zone_id, Some(3));
        assert_eq!(state.current, Some(RoomKey::portal("home")));

        let out = on_portal_key(&mut SessionState::new(), "nope", Some(&Remote)).unwrap();
        assert_eq!(out, BindOutcome::Unplaced);
    }
}
