//! In-process map store for offline runs and tests.

use std::cell::RefCell;
use std::collections::HashSet;

use mw_core::{Direction, KnownRoom, ZoneInfo};

use crate::error::{StoreError, StoreResult};
use crate::store::{MapStore, NewExit, NewRoom};

/// A [`MapStore`] that keeps everything in memory.
///
/// Ids start at 1 and increase per kind. Rooms named in `refuse_room` and
/// exits in a refused direction are rejected, which lets callers exercise
/// partial failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    zones: Vec<ZoneInfo>,
    rooms: RefCell<Vec<(i64, NewRoom)>>,
    exits: RefCell<Vec<(i64, NewExit)>>,
    refused_rooms: HashSet<String>,
    refused_directions: HashSet<Direction>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zone directory.
    pub fn with_zones(mut self, zones: Vec<ZoneInfo>) -> Self {
        self.zones = zones;
        self
    }

    /// Pre-load a room, as if saved by an earlier run.
    pub fn with_room(self, room: NewRoom) -> Self {
        {
            let mut rooms = self.rooms.borrow_mut();
            let id = rooms.len() as i64 + 1;
            rooms.push((id, room));
        }
        self
    }

    /// Reject rooms with this name.
    pub fn refuse_room(mut self, name: impl Into<String>) -> Self {
        self.refused_rooms.insert(name.into());
        self
    }

    /// Reject exits in this direction.
    pub fn refuse_direction(mut self, direction: Direction) -> Self {
        self.refused_directions.insert(direction);
        self
    }

    /// Rooms stored so far, with their ids.
    pub fn rooms(&self) -> Vec<(i64, NewRoom)> {
        self.rooms.borrow().clone()
    }

    /// Exits stored so far, with their ids.
    pub fn exits(&self) -> Vec<(i64, NewExit)> {
        self.exits.borrow().clone()
    }
}

impl MapStore for MemoryStore {
    fn zones(&self) -> StoreResult<Vec<ZoneInfo>> {
        Ok(self.zones.clone())
    }

    fn find_rooms_by_portal_key(&self, portal_key: &str) -> StoreResult<Vec<KnownRoom>> {
        Ok(self
            .rooms
            .borrow()
            .iter()
            .filter(|(_, r)| r.portal_key.as_deref() == Some(portal_key))
            .map(|(id, r)| KnownRoom {
                id: *id,
                name: r.name.clone(),
                description: r.description.clone(),
                portal_key: r.portal_key.clone(),
                zone_id: r.zone_id,
            })
            .collect())
    }

    fn create_room(&self, room: &NewRoom) -> StoreResult<i64> {
        if self.refused_rooms.contains(&room.name) {
            return Err(StoreError::Rejected(format!("room {:?}", room.name)));
        }
        let mut rooms = self.rooms.borrow_mut();
        let id = rooms.len() as i64 + 1;
        rooms.push((id, room.clone()));
        Ok(id)
    }

    fn create_exit(&self, exit: &NewExit) -> StoreResult<i64> {
        if self.refused_directions.contains(&exit.direction) {
            return Err(StoreError::Rejected(format!("exit {}", exit.direction)));
        }
        let mut exits = self.exits.borrow_mut();
        let id = exits.len() as i64 + 1;
        exits.push((id, exit.clone()));
        Ok(id)
    }
}
