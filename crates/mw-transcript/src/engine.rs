//! The transcript engine: one sequential pass over the lines.

use std::path::Path;

use mw_core::{
    MapGraph, MapResult, Room, RoomKey, RoomLookup, Snapshot, ZoneInfo, ZoneReport, resolve_zones,
};

use crate::config::EngineConfig;
use crate::error::{TranscriptError, TranscriptResult};
use crate::exits;
use crate::line::Line;
use crate::portal;
use crate::resolver::{self, Resolution};
use crate::rules::{self, Blockage, Event};
use crate::scan::{self, Observation};
use crate::session::{Ambiguity, ParseStats, PendingMove, SessionState, Sighting, Visit};

/// Turns transcripts into a room graph.
///
/// One engine holds the state of one session. Feeding it several transcripts
/// continues the same session.
pub struct Engine<'a> {
    config: EngineConfig,
    state: SessionState,
    lookup: Option<&'a dyn RoomLookup>,
}

/// The finished map of a session.
#[derive(Debug)]
pub struct ParsedMap {
    /// Room graph with zones resolved.
    pub graph: MapGraph,
    /// Outcome of the zone pass.
    pub zones: ZoneReport,
    /// Counters from parsing.
    pub stats: ParseStats,
    /// Observations that could not be resolved.
    pub ambiguities: Vec<Ambiguity>,
}

impl ParsedMap {
    /// Capture the map for export.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.graph,
            self.zones.default_zone.clone(),
            self.stats.to_map(),
        )
    }
}

impl Default for Engine<'_> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<'a> Engine<'a> {
    /// Create an engine with a fresh session.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: SessionState::new(),
            lookup: None,
        }
    }

    /// Use a remote room lookup to place the first room of a session.
    pub fn with_lookup(mut self, lookup: &'a dyn RoomLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Read and parse a transcript file. Invalid UTF-8 is replaced, not fatal.
    pub fn parse_file(&mut self, path: &Path) -> TranscriptResult<()> {
        let bytes = std::fs::read(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&String::from_utf8_lossy(&bytes));
        Ok(())
    }

    /// Parse transcript text.
    pub fn parse(&mut self, transcript: &str) {
        let lines = Line::parse_all(transcript);
        self.state.stats.lines += lines.len() as u64;
        let mut i = 0;
        while i < lines.len() {
            i += self.step(&lines, i).max(1);
        }
        tracing::debug!(
            rooms = self.state.graph.room_count(),
            exits = self.state.graph.exit_count(),
            "transcript parsed"
        );
    }

    /// Handle the line at `i` and return how many lines were consumed.
    fn step(&mut self, lines: &[Line], i: usize) -> usize {
        let line = &lines[i];
        let Some((rule, event)) = rules::classify(line) else {
            return 1;
        };
        self.state.stats.events += 1;
        tracing::trace!(line = line.number, rule, "event");

        match self.apply(lines, i, event) {
            Ok(consumed) => consumed,
            Err(err) => {
                tracing::warn!(line = line.number, rule, %err, "line skipped");
                self.state.stats.skipped_lines += 1;
                1
            }
        }
    }

    fn apply(&mut self, lines: &[Line], i: usize, event: Event) -> MapResult<usize> {
        let state = &mut self.state;
        match event {
            Event::PortalKey(pk) => {
                let outcome = portal::on_portal_key(state, &pk, self.lookup)?;
                tracing::debug!(portal_key = %pk, ?outcome, "portal result");
            }
            Event::BindFailed(failure) => portal::on_bind_failure(state, failure, &self.config),
            Event::BindAttempt => portal::on_bind_attempt(state),
            Event::LookDirection(direction) => {
                let scan = scan::scan_look_text(&lines[i + 1..], self.config.look_lookahead);
                if let Some(from) = state.current.clone() {
                    exits::attach_look(state, &from, direction, scan.value)?;
                }
                return Ok(1 + scan.consumed);
            }
            Event::ZoneBanner(zone) => state.zone_banner(zone),
            Event::Death => {
                state.stats.deaths += 1;
                state.lose_position();
            }
            Event::Respawn => state.lose_position(),
            Event::Look => state.pending_moves.clear(),
            Event::Move(direction) => state.pending_moves.push_back(PendingMove {
                direction,
                fled: false,
            }),
            Event::Flee(direction) => state.pending_moves.push_back(PendingMove {
                direction,
                fled: true,
            }),
            Event::Blocked(blockage) => self.blocked(&blockage, &lines[i].text)?,
            Event::RoomTitle(_) => {
                let scan = scan::scan_observation(
                    &lines[i..],
                    self.config.title_lookahead,
                    self.config.exit_lookahead,
                );
                self.observe(scan.value)?;
                return Ok(scan.consumed);
            }
        }
        Ok(1)
    }

    fn blocked(&mut self, blockage: &Blockage, message: &str) -> MapResult<()> {
        let Some(pending) = self.state.pending_moves.pop_front() else {
            return Ok(());
        };
        match self.state.current.clone() {
            Some(from) => {
                exits::record_blocked(&mut self.state, &from, pending.direction, blockage, message)?;
            }
            None if *blockage == Blockage::NoExit => self.state.stats.discarded_moves += 1,
            None => {}
        }
        Ok(())
    }

    fn observe(&mut self, obs: Observation) -> MapResult<()> {
        let pending = self.state.pending_moves.pop_front();
        let resolution = resolver::resolve(&self.state.graph, &obs, &self.config);
        tracing::debug!(line = obs.line, name = %obs.name, ?resolution, "room resolved");

        let seen = Sighting {
            exits: obs.exits.directions.clone(),
            npcs: obs.npcs.clone(),
            items: obs.items.clone(),
        };
        let (key, before) = match resolution {
            Resolution::Ambiguous { candidates } => {
                let placeholder = self.create_room(&obs)?;
                tracing::warn!(
                    line = obs.line,
                    name = %obs.name,
                    candidates = candidates.len(),
                    "ambiguous room; recorded as new"
                );
                self.state.stats.ambiguities += 1;
                self.state.ambiguities.push(Ambiguity {
                    line: obs.line,
                    name: obs.name.clone(),
                    candidates,
                    placeholder: placeholder.clone(),
                });
                (placeholder, None)
            }
            Resolution::New => (self.create_room(&obs)?, None),
            known => {
                let Some(key) = known.existing().cloned() else {
                    return Ok(());
                };
                let before = self.state.graph.room_mut(&key).map(|room| {
                    let before = Sighting::of(room);
                    seen.merge_into(room);
                    before
                });
                self.state.stats.rooms_revisited += 1;
                (key, before)
            }
        };

        let from = self.state.current.clone();
        self.state.enter(key.clone());
        self.state.record_visit(&key, Visit { seen, before });
        if let (Some(from), Some(step)) = (from, pending) {
            let outcome = exits::record_move(&mut self.state, &from, step.direction, &key)?;
            tracing::debug!(%from, to = %key, direction = %step.direction, fled = step.fled, ?outcome, "move");
        }
        exits::note_doors(&mut self.state, &key, &obs.exits.doors);
        Ok(())
    }

    fn create_room(&mut self, obs: &Observation) -> MapResult<RoomKey> {
        let key = self.state.issue_key(&obs.name, &obs.description);
        let mut room = Room::new(key.clone(), obs.name.clone(), obs.description.clone())
            .with_exits(obs.exits.directions.iter().copied());
        room.npcs = obs.npcs.clone();
        room.items = obs.items.clone();
        self.state.graph.add_room(room)?;
        self.state.stats.rooms_created += 1;
        tracing::debug!(room = %key, "new room");
        Ok(key)
    }

    /// End the session: run the zone pass and hand over the map.
    ///
    /// `directory` maps displayed zone names to ids; `zone_override` replaces
    /// the first zone seen as the default.
    pub fn finish(self, directory: &[ZoneInfo], zone_override: Option<i64>) -> ParsedMap {
        let mut state = self.state;
        let zones = resolve_zones(
            &mut state.graph,
            &state.zone_map,
            state.first_zone.as_deref(),
            directory,
            zone_override,
        );
        ParsedMap {
            graph: state.graph,
            zones,
            stats: state.stats,
            ambiguities: state.ambiguities,
        }
    }
}

/// Parse a transcript with default settings and no remote lookup.
pub fn parse_transcript(transcript: &str) -> ParsedMap {
    let mut engine = Engine::default();
    engine.parse(transcript);
    engine.finish(&[], None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_core::Direction;

    const CORRIDOR: &str = r#"<span class="cyan">Corridor</span>
<span class="gray">A narrow corridor.</span>
<span class="teal">[Exits: north south]</span>
<100hp> s
<span class="cyan">Clearing</span>
<span class="gray">A sunny clearing.</span>
<span class="teal">[Exits: north]</span>
<100hp>"#;

    #[test]
    fn walk_between_two_rooms() {
        let map = parse_transcript(CORRIDOR);
        assert_eq!(map.graph.room_count(), 2);
        assert_eq!(map.graph.exit_count(), 2);
        assert_eq!(map.stats.exits_created, 1);
        assert_eq!(map.stats.reverse_exits, 1);
        assert_eq!(map.stats.lines, 8);
    }

    #[test]
    fn look_direction_attaches_text() {
        let text = format!("{CORRIDOR}\n<100hp> look north\nA path leads into the corridor.\n<100hp>");
        let map = parse_transcript(&text);
        let clearing = map
            .graph
            .rooms()
            .find(|r| r.name == "Clearing")
            .map(|r| r.key.clone())
            .unwrap();
        let exit = map.graph.exit_from(&clearing, Direction::North).unwrap();
        assert_eq!(
            exit.look_description.as_deref(),
            Some("A path leads into the corridor.")
        );
    }

    #[test]
    fn death_clears_position() {
        let text = format!("{CORRIDOR}\nYou are DEAD!\n<1hp> n\n<span class=\"cyan\">Temple</span>\n<1hp>");
        let mut engine = Engine::default();
        engine.parse(&text);
        assert_eq!(engine.state().stats.deaths, 1);
        let map = engine.finish(&[], None);
        assert_eq!(map.graph.room_count(), 3);
        assert_eq!(map.graph.exit_count(), 2);
    }

    #[test]
    fn zone_banner_sets_default_zone() {
        let text = format!("{CORRIDOR}\nYou are in the zone: Midgaard.");
        let map = parse_transcript(&text);
        assert_eq!(map.zones.default_zone.name.as_deref(), Some("Midgaard"));
        let snapshot = map.snapshot();
        assert_eq!(snapshot.rooms.len(), 2);
        assert_eq!(snapshot.stats["rooms_created"], 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut engine = Engine::default();
        let err = engine
            .parse_file(Path::new("/nonexistent/mapwright.log"))
            .unwrap_err();
        assert!(matches!(err, TranscriptError::Io { .. }));
    }
}
