//! Mutable working state of one transcript pass.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use mw_core::{Direction, MapGraph, MapResult, MergeOutcome, Room, RoomKey};
use serde::Serialize;

/// A movement command whose outcome has not been printed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    /// Direction of travel.
    pub direction: Direction,
    /// The move was a flee.
    pub fled: bool,
}

/// Exits, NPCs and items of a room at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sighting {
    /// Announced exit directions.
    pub exits: BTreeSet<Direction>,
    /// NPCs present.
    pub npcs: Vec<String>,
    /// Items lying around.
    pub items: Vec<String>,
}

impl Sighting {
    /// What `room` holds now.
    pub fn of(room: &Room) -> Self {
        Self {
            exits: room.exits.clone(),
            npcs: room.npcs.clone(),
            items: room.items.clone(),
        }
    }

    /// Put `room` back to exactly this state.
    pub fn restore(self, room: &mut Room) {
        room.exits = self.exits;
        room.npcs = self.npcs;
        room.items = self.items;
    }

    /// Union this sighting into `room`.
    pub fn merge_into(&self, room: &mut Room) {
        room.absorb(&self.exits, &self.npcs, &self.items);
    }
}

/// The latest entry into a room, kept until a portal key confirms or
/// refutes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// What the room display showed.
    pub seen: Sighting,
    /// The room before `seen` was unioned in; `None` when the entry created it.
    pub before: Option<Sighting>,
}

/// An observation that matched several portal-keyed rooms equally badly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ambiguity {
    /// Line of the room title.
    pub line: usize,
    /// Room title.
    pub name: String,
    /// Rooms that shared title and description.
    pub candidates: Vec<RoomKey>,
    /// Key allocated instead of guessing.
    pub placeholder: RoomKey,
}

/// Counters describing a transcript pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Lines read.
    pub lines: u64,
    /// Lines that produced an event.
    pub events: u64,
    /// Rooms created.
    pub rooms_created: u64,
    /// Room displays resolved to a known room.
    pub rooms_revisited: u64,
    /// Forward exits recorded from observed moves.
    pub exits_created: u64,
    /// Reverse exits synthesised.
    pub reverse_exits: u64,
    /// Inferred exits replaced by an observed move.
    pub exits_corrected: u64,
    /// Blocked exits recorded.
    pub blocked_exits: u64,
    /// Exits that received look text.
    pub exits_described: u64,
    /// Moves that contradicted an observed exit.
    pub exit_conflicts: u64,
    /// Moves refused for lack of an exit.
    pub discarded_moves: u64,
    /// Unresolved observations.
    pub ambiguities: u64,
    /// Rooms renamed to a portal-derived key.
    pub promotions: u64,
    /// Duplicate rooms folded into their portal-keyed twin.
    pub merges: u64,
    /// Misidentified rooms repaired.
    pub misidentifications: u64,
    /// Exits removed while repairing misidentifications.
    pub exits_rolled_back: u64,
    /// Portal bind attempts.
    pub bind_attempts: u64,
    /// Portal bind failures of either kind.
    pub bind_failures: u64,
    /// Rooms marked as no-magic.
    pub no_magic_rooms: u64,
    /// Deaths seen.
    pub deaths: u64,
    /// Rooms placed from the remote store.
    pub bootstrapped_rooms: u64,
    /// Lines whose handling failed and were skipped.
    pub skipped_lines: u64,
}

impl ParseStats {
    /// The counters as a name-to-value map, for export.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(fields)) => fields
                .into_iter()
                .filter_map(|(k, v)| v.as_u64().map(|n| (k, n)))
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// Everything the engine tracks between lines.
#[derive(Debug, Default)]
pub struct SessionState {
    /// The map being built.
    pub graph: MapGraph,
    /// Where the player is believed to stand.
    pub current: Option<RoomKey>,
    /// Movements awaiting their outcome, oldest first.
    pub pending_moves: VecDeque<PendingMove>,
    /// Room in which the last unresolved bind attempt was made.
    pub pending_bind: Option<RoomKey>,
    /// Rooms where portal binding never works.
    pub no_magic: HashSet<RoomKey>,
    /// Consecutive lost-concentration failures per room.
    pub bind_failures: HashMap<RoomKey, u32>,
    /// Zone banner seen in each room.
    pub zone_map: IndexMap<RoomKey, String>,
    /// First zone banner of the session.
    pub first_zone: Option<String>,
    /// Open identity questions, for the report.
    pub ambiguities: Vec<Ambiguity>,
    /// Counters.
    pub stats: ParseStats,

    // Composite bases ever issued and how often. Never shrinks.
    issued: HashMap<String, u32>,
    // Exit watermark when each room was last entered.
    entered_at: HashMap<RoomKey, u64>,
    // Zone banner seen while the position was unknown.
    pending_zone: Option<String>,
    // Latest entry into each room.
    visits: HashMap<RoomKey, Visit>,
}

impl SessionState {
    /// Fresh state with an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a composite key for a new room. A composite that was ever
    /// issued before, even to a room since renamed or merged, is never reused.
    pub fn issue_key(&mut self, name: &str, description: &str) -> RoomKey {
        let base = RoomKey::composite_base(name, description);
        let count = self.issued.entry(base).or_insert(0);
        loop {
            *count += 1;
            let key = RoomKey::composite(name, description, *count);
            if !self.graph.contains_room(&key) {
                return key;
            }
        }
    }

    /// Record that the player now stands in `key`.
    pub fn enter(&mut self, key: RoomKey) {
        self.entered_at
            .insert(key.clone(), self.graph.exit_watermark());
        if let Some(zone) = self.pending_zone.take() {
            self.note_zone(&key, zone);
        }
        self.current = Some(key);
    }

    /// Exit watermark at the moment `key` was last entered.
    pub fn entered_at(&self, key: &RoomKey) -> u64 {
        self.entered_at.get(key).copied().unwrap_or(0)
    }

    /// Remember what the latest entry into `key` showed.
    pub fn record_visit(&mut self, key: &RoomKey, visit: Visit) {
        self.visits.insert(key.clone(), visit);
    }

    /// The latest entry into `key`, if not yet consumed.
    pub fn last_visit(&self, key: &RoomKey) -> Option<&Visit> {
        self.visits.get(key)
    }

    /// Consume the latest entry into `key`.
    pub fn take_visit(&mut self, key: &RoomKey) -> Option<Visit> {
        self.visits.remove(key)
    }

    /// Forget where the player is (death, respawn).
    pub fn lose_position(&mut self) {
        self.current = None;
        self.pending_moves.clear();
        self.pending_bind = None;
    }

    /// Record a zone banner for the current room.
    pub fn zone_banner(&mut self, zone: String) {
        if self.first_zone.is_none() {
            self.first_zone = Some(zone.clone());
        }
        match self.current.clone() {
            Some(key) => self.note_zone(&key, zone),
            None => self.pending_zone = Some(zone),
        }
    }

    fn note_zone(&mut self, key: &RoomKey, zone: String) {
        self.zone_map.insert(key.clone(), zone);
    }

    /// Mark a room as one where portal binding never works.
    pub fn mark_no_magic(&mut self, key: &RoomKey) {
        self.bind_failures.remove(key);
        if self.no_magic.insert(key.clone()) {
            self.stats.no_magic_rooms += 1;
        }
        if let Some(room) = self.graph.room_mut(key) {
            room.no_magic = true;
        }
    }

    /// Rename a room and every reference the session holds to it.
    ///
    /// The position pointer follows only if it still points at the old key;
    /// the player may have walked on since the bind attempt.
    pub fn rename_room(&mut self, old: &RoomKey, new: RoomKey) -> MapResult<()> {
        self.graph.rename_room(old, new.clone())?;
        if self.current.as_ref() == Some(old) {
            self.current = Some(new.clone());
        }
        self.repoint(old, &new);
        Ok(())
    }

    /// Fold a duplicate room into its twin and repoint every reference.
    pub fn merge_room(&mut self, from: &RoomKey, into: &RoomKey) -> MapResult<MergeOutcome> {
        let outcome = self.graph.merge_room(from, into)?;
        if self.current.as_ref() == Some(from) {
            self.current = Some(into.clone());
        }
        self.repoint(from, into);
        Ok(outcome)
    }

    fn repoint(&mut self, old: &RoomKey, new: &RoomKey) {
        if self.pending_bind.as_ref() == Some(old) {
            self.pending_bind = Some(new.clone());
        }
        if self.no_magic.remove(old) {
            self.no_magic.insert(new.clone());
        }
        if let Some(count) = self.bind_failures.remove(old) {
            self.bind_failures.entry(new.clone()).or_insert(count);
        }
        if let Some(at) = self.entered_at.remove(old) {
            let slot = self.entered_at.entry(new.clone()).or_insert(at);
            *slot = (*slot).max(at);
        }
        if let Some(visit) = self.visits.remove(old) {
            self.visits.entry(new.clone()).or_insert(visit);
        }
        if self.zone_map.contains_key(old) {
            // Rebuild to keep first-seen order; an existing entry for `new` wins.
            for (k, v) in std::mem::take(&mut self.zone_map) {
                let k = if &k == old { new.clone() } else { k };
                self.zone_map.entry(k).or_insert(v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(keys: &[&str]) -> SessionState {
        let mut state = SessionState::new();
        for k in keys {
            state
                .graph
                .add_room(Room::new(RoomKey::from_raw(*k), *k, ""))
                .unwrap();
        }
        state
    }

    #[test]
    fn issued_keys_are_never_reused() {
        let mut state = SessionState::new();
        let first = state.issue_key("Hall", "Big.");
        state.graph.add_room(Room::new(first.clone(), "Hall", "Big.")).unwrap();
        state.rename_room(&first, RoomKey::portal("p1")).unwrap();

        let second = state.issue_key("Hall", "Big.");
        assert_ne!(first, second);
        assert!(second.as_str().ends_with("~2"));
    }

    #[test]
    fn rename_moves_pointer_only_when_still_there() {
        let mut state = state_with(&["a", "b"]);
        state.enter(RoomKey::from_raw("b"));
        state.pending_bind = Some(RoomKey::from_raw("a"));
        state.zone_banner("Town".into());
        state
            .rename_room(&RoomKey::from_raw("a"), RoomKey::portal("x"))
            .unwrap();

        assert_eq!(state.current, Some(RoomKey::from_raw("b")));
        assert_eq!(state.pending_bind, Some(RoomKey::portal("x")));
    }

    #[test]
    fn rename_rewrites_zone_map_in_place() {
        let mut state = state_with(&["a", "b"]);
        state.enter(RoomKey::from_raw("a"));
        state.zone_banner("Town".into());
        state.enter(RoomKey::from_raw("b"));
        state.zone_banner("Woods".into());
        state
            .rename_room(&RoomKey::from_raw("a"), RoomKey::portal("x"))
            .unwrap();

        let keys: Vec<_> = state.zone_map.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["pk:x", "b"]);
        assert_eq!(state.zone_map[&RoomKey::portal("x")], "Town");
        assert_eq!(state.first_zone.as_deref(), Some("Town"));
    }

    #[test]
    fn visit_follows_rename_and_restores_room() {
        let mut state = state_with(&["a"]);
        let a = RoomKey::from_raw("a");
        let before = Sighting {
            exits: [Direction::North].into_iter().collect(),
            ..Sighting::default()
        };
        let seen = Sighting {
            exits: [Direction::West].into_iter().collect(),
            npcs: vec!["a rat".into()],
            ..Sighting::default()
        };
        seen.merge_into(state.graph.room_mut(&a).unwrap());
        state.record_visit(
            &a,
            Visit {
                seen: seen.clone(),
                before: Some(before.clone()),
            },
        );
        state.rename_room(&a, RoomKey::portal("x")).unwrap();

        let x = RoomKey::portal("x");
        assert!(state.last_visit(&a).is_none());
        let visit = state.take_visit(&x).unwrap();
        assert_eq!(visit.seen, seen);
        visit.before.unwrap().restore(state.graph.room_mut(&x).unwrap());
        assert_eq!(Sighting::of(state.graph.room(&x).unwrap()), before);
        assert!(state.take_visit(&x).is_none());
    }

    #[test]
    fn zone_seen_before_position_is_applied_on_entry() {
        let mut state = state_with(&["a"]);
        state.zone_banner("Town".into());
        assert!(state.zone_map.is_empty());
        state.enter(RoomKey::from_raw("a"));
        assert_eq!(state.zone_map[&RoomKey::from_raw("a")], "Town");
    }

    #[test]
    fn no_magic_marking_counts_once() {
        let mut state = state_with(&["a"]);
        let a = RoomKey::from_raw("a");
        state.mark_no_magic(&a);
        state.mark_no_magic(&a);
        assert_eq!(state.stats.no_magic_rooms, 1);
        assert!(state.graph.room(&a).unwrap().no_magic);
    }

    #[test]
    fn stats_map_has_every_counter() {
        let stats = ParseStats {
            lines: 7,
            ..ParseStats::default()
        };
        let map = stats.to_map();
        assert_eq!(map["lines"], 7);
        assert!(map.contains_key("misidentifications"));
    }
}
