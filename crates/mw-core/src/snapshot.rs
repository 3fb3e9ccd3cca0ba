//! JSON dump of a finished map: `{rooms, exits, stats}`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MapResult;
use crate::exit::Exit;
use crate::graph::MapGraph;
use crate::room::Room;
use crate::zone::DefaultZone;

/// A serialisable copy of a room graph plus parse statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub exported_at: DateTime<Utc>,
    /// Default zone of the session.
    #[serde(default)]
    pub default_zone: DefaultZone,
    /// All rooms, in graph order.
    pub rooms: Vec<Room>,
    /// All exits, in creation order.
    pub exits: Vec<Exit>,
    /// Named counters describing the run.
    #[serde(default)]
    pub stats: BTreeMap<String, u64>,
}

impl Snapshot {
    /// Capture a graph.
    pub fn capture(graph: &MapGraph, default_zone: DefaultZone, stats: BTreeMap<String, u64>) -> Self {
        Self {
            exported_at: Utc::now(),
            default_zone,
            rooms: graph.rooms().cloned().collect(),
            exits: graph.exits().cloned().collect(),
            stats,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> MapResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON dump.
    pub fn from_json(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the graph. Exit ids are reassigned in the original order.
    pub fn into_graph(self) -> MapResult<MapGraph> {
        let mut graph = MapGraph::new();
        for room in self.rooms {
            graph.add_room(room)?;
        }
        for exit in self.exits {
            graph.add_exit(exit)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::room::RoomKey;

    #[test]
    fn export_then_import_keeps_counts() {
        let mut graph = MapGraph::new();
        let mut hall =
            Room::new(RoomKey::portal("aa"), "Hall", "A hall.").with_exits([Direction::North]);
        hall.portal_key = Some("aa".into());
        let a = graph.add_room(hall).unwrap();
        let b = graph
            .add_room(Room::new(RoomKey::composite("Yard", "A yard.", 1), "Yard", "A yard."))
            .unwrap();
        graph.add_exit(Exit::new(a.clone(), Direction::North, b.clone())).unwrap();
        graph
            .add_exit(Exit::new(b, Direction::South, a.clone()).inferred())
            .unwrap();
        graph.add_exit(Exit::blocked(a, Direction::Down)).unwrap();

        let mut stats = BTreeMap::new();
        stats.insert("lines".to_string(), 12);
        let json = Snapshot::capture(&graph, DefaultZone::default(), stats)
            .to_json()
            .unwrap();

        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back.stats["lines"], 12);
        let rebuilt = back.into_graph().unwrap();
        assert_eq!(rebuilt.room_count(), 2);
        assert_eq!(rebuilt.exit_count(), 3);
        assert_eq!(rebuilt.blocked_exit_count(), 1);
        assert_eq!(rebuilt.find_by_portal_key("aa").unwrap().name, "Hall");
    }

    #[test]
    fn json_has_top_level_sections() {
        let json = Snapshot::capture(&MapGraph::new(), DefaultZone::default(), BTreeMap::new())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["rooms"].is_array());
        assert!(value["exits"].is_array());
        assert!(value["stats"].is_object());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Snapshot::from_json("{ not json").is_err());
    }
}
