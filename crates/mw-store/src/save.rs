//! Flushing a finished graph to a store.

use std::collections::HashMap;

use mw_core::{MapGraph, RoomKey};
use serde::Serialize;

use crate::store::{MapStore, NewExit, NewRoom};

/// Per-item outcome counts of a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Rooms created.
    pub rooms_saved: usize,
    /// Rooms matched to an existing remote room by portal key.
    pub rooms_reused: usize,
    /// Rooms the store refused.
    pub rooms_failed: usize,
    /// Exits created.
    pub exits_saved: usize,
    /// Exits the store refused.
    pub exits_failed: usize,
    /// Exits not sent because an end has no remote id.
    pub exits_skipped: usize,
}

impl SaveReport {
    /// Items that did not make it.
    pub fn failed(&self) -> usize {
        self.rooms_failed + self.exits_failed + self.exits_skipped
    }

    /// Items stored or reused.
    pub fn saved(&self) -> usize {
        self.rooms_saved + self.rooms_reused + self.exits_saved
    }
}

/// Save rooms, then exits. Every failure is logged and counted; none aborts
/// the batch.
pub fn save_graph(store: &dyn MapStore, graph: &MapGraph) -> SaveReport {
    let mut report = SaveReport::default();
    let mut ids: HashMap<&RoomKey, i64> = HashMap::new();

    for room in graph.rooms() {
        if let Some(pk) = &room.portal_key {
            match store.find_rooms_by_portal_key(pk) {
                Ok(found) => {
                    if let Some(existing) = found.first() {
                        tracing::debug!(room = %room.key, remote_id = existing.id, "reusing remote room");
                        ids.insert(&room.key, existing.id);
                        report.rooms_reused += 1;
                        continue;
                    }
                }
                Err(err) => tracing::warn!(room = %room.key, %err, "portal key lookup failed"),
            }
        }
        match store.create_room(&NewRoom::from_room(room)) {
            Ok(id) => {
                ids.insert(&room.key, id);
                report.rooms_saved += 1;
            }
            Err(err) => {
                tracing::warn!(room = %room.key, %err, "failed to save room");
                report.rooms_failed += 1;
            }
        }
    }

    for exit in graph.exits() {
        let Some(&from) = ids.get(&exit.from) else {
            report.exits_skipped += 1;
            continue;
        };
        let to = match &exit.to {
            Some(key) => match ids.get(key) {
                Some(&id) => Some(id),
                None => {
                    report.exits_skipped += 1;
                    continue;
                }
            },
            None => None,
        };
        match store.create_exit(&NewExit::from_exit(exit, from, to)) {
            Ok(_) => report.exits_saved += 1,
            Err(err) => {
                tracing::warn!(exit = %exit.id, from = %exit.from, direction = %exit.direction, %err, "failed to save exit");
                report.exits_failed += 1;
            }
        }
    }

    tracing::info!(?report, "map saved");
    report
}
