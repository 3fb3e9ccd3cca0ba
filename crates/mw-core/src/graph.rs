use std::collections::HashMap;

use indexmap::IndexMap;

use crate::direction::Direction;
use crate::error::{MapError, MapResult};
use crate::exit::{Exit, ExitId};
use crate::room::{Room, RoomKey};

/// What a merge did to the exits of the absorbed room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Exits whose source or destination was rewritten.
    pub rewritten: usize,
    /// Exits dropped because the survivor already had one that way.
    pub dropped: usize,
}

/// The room graph. Owns all rooms and exits.
///
/// Insertion order is preserved so that exports of the same transcript are
/// stable. At most one room holds any given portal key, and at most one exit
/// leaves a room in any given direction.
#[derive(Debug, Clone, Default)]
pub struct MapGraph {
    rooms: IndexMap<RoomKey, Room>,
    exits: IndexMap<ExitId, Exit>,
    next_exit: u64,

    // Indexes
    by_portal_key: HashMap<String, RoomKey>,
}

impl MapGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------------

    /// Add a room. Fails if the key or its portal key is already taken.
    pub fn add_room(&mut self, room: Room) -> MapResult<RoomKey> {
        if self.rooms.contains_key(&room.key) {
            return Err(MapError::DuplicateKey(room.key));
        }
        if let Some(pk) = &room.portal_key {
            if let Some(holder) = self.by_portal_key.get(pk) {
                return Err(MapError::PortalKeyTaken {
                    portal_key: pk.clone(),
                    holder: holder.clone(),
                });
            }
            self.by_portal_key.insert(pk.clone(), room.key.clone());
        }
        let key = room.key.clone();
        self.rooms.insert(key.clone(), room);
        Ok(key)
    }

    /// Get a room by key.
    pub fn room(&self, key: &RoomKey) -> Option<&Room> {
        self.rooms.get(key)
    }

    /// Get a mutable room by key.
    ///
    /// Callers must not change `key` or `portal_key` through this reference;
    /// use [`MapGraph::rename_room`] and [`MapGraph::bind_portal_key`].
    pub fn room_mut(&mut self, key: &RoomKey) -> Option<&mut Room> {
        self.rooms.get_mut(key)
    }

    /// Whether a room with this key exists.
    pub fn contains_room(&self, key: &RoomKey) -> bool {
        self.rooms.contains_key(key)
    }

    /// All rooms, in insertion order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// All rooms, mutably.
    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    /// The room holding a portal key.
    pub fn find_by_portal_key(&self, portal_key: &str) -> Option<&Room> {
        self.by_portal_key
            .get(portal_key)
            .and_then(|key| self.rooms.get(key))
    }

    /// Rooms showing exactly this title and description.
    pub fn rooms_with_text(&self, name: &str, description: &str) -> Vec<&Room> {
        self.rooms
            .values()
            .filter(|r| r.same_text(name, description))
            .collect()
    }

    /// Rooms with this title.
    pub fn rooms_named(&self, name: &str) -> Vec<&Room> {
        self.rooms.values().filter(|r| r.name == name).collect()
    }

    /// Attach a portal key to a room that has none.
    pub fn bind_portal_key(&mut self, key: &RoomKey, portal_key: &str) -> MapResult<()> {
        if let Some(holder) = self.by_portal_key.get(portal_key) {
            if holder != key {
                return Err(MapError::PortalKeyTaken {
                    portal_key: portal_key.to_string(),
                    holder: holder.clone(),
                });
            }
        }
        let room = self
            .rooms
            .get_mut(key)
            .ok_or_else(|| MapError::RoomNotFound(key.clone()))?;
        if let Some(old) = room.portal_key.replace(portal_key.to_string()) {
            self.by_portal_key.remove(&old);
        }
        self.by_portal_key
            .insert(portal_key.to_string(), key.clone());

        for exit in self.exits.values_mut() {
            if exit.to.as_ref() == Some(key) {
                exit.portal_key = Some(portal_key.to_string());
            }
        }
        Ok(())
    }

    /// Give a room a new key, rewriting every exit that referenced the old one.
    /// The room keeps its position in iteration order.
    pub fn rename_room(&mut self, old: &RoomKey, new: RoomKey) -> MapResult<()> {
        if old == &new {
            return Ok(());
        }
        if self.rooms.contains_key(&new) {
            return Err(MapError::DuplicateKey(new));
        }
        let index = self
            .rooms
            .get_index_of(old)
            .ok_or_else(|| MapError::RoomNotFound(old.clone()))?;
        let Some(mut room) = self.rooms.shift_remove(old) else {
            return Err(MapError::RoomNotFound(old.clone()));
        };
        room.key = new.clone();
        if let Some(pk) = &room.portal_key {
            self.by_portal_key.insert(pk.clone(), new.clone());
        }
        self.rooms.shift_insert(index, new.clone(), room);

        for exit in self.exits.values_mut() {
            if &exit.from == old {
                exit.from = new.clone();
            }
            if exit.to.as_ref() == Some(old) {
                exit.to = Some(new.clone());
            }
        }
        Ok(())
    }

    /// Fold `from` into `into`: union its observations, rewrite every exit that
    /// referenced it, then delete it. Exits of `from` that would collide with an
    /// existing exit of `into` in the same direction are dropped, except that
    /// they may fill in an unknown destination.
    pub fn merge_room(&mut self, from: &RoomKey, into: &RoomKey) -> MapResult<MergeOutcome> {
        if from == into {
            return Ok(MergeOutcome::default());
        }
        if !self.rooms.contains_key(into) {
            return Err(MapError::RoomNotFound(into.clone()));
        }
        let absorbed = self
            .rooms
            .shift_remove(from)
            .ok_or_else(|| MapError::RoomNotFound(from.clone()))?;
        if let Some(pk) = &absorbed.portal_key {
            self.by_portal_key.remove(pk);
        }
        if let Some(survivor) = self.rooms.get_mut(into) {
            survivor.absorb(&absorbed.exits, &absorbed.npcs, &absorbed.items);
        }

        let mut outcome = MergeOutcome::default();

        // Inbound edges first: their (source, direction) pairs stay unique.
        let survivor_pk = self.rooms.get(into).and_then(|r| r.portal_key.clone());
        for exit in self.exits.values_mut() {
            if exit.to.as_ref() == Some(from) && &exit.from != from {
                exit.to = Some(into.clone());
                if survivor_pk.is_some() {
                    exit.portal_key.clone_from(&survivor_pk);
                }
                outcome.rewritten += 1;
            }
        }

        let outbound: Vec<ExitId> = self
            .exits
            .values()
            .filter(|e| &e.from == from)
            .map(|e| e.id)
            .collect();
        for id in outbound {
            let Some(mut exit) = self.exits.shift_remove(&id) else {
                continue;
            };
            exit.from = into.clone();
            if exit.to.as_ref() == Some(from) || exit.to.as_ref() == Some(into) {
                outcome.dropped += 1;
                continue;
            }
            let existing = self
                .exits
                .values()
                .find(|e| &e.from == into && e.direction == exit.direction)
                .map(|e| e.id);
            match existing.and_then(|kept| self.exits.get_mut(&kept)) {
                Some(kept) => {
                    if kept.to.is_none() && !kept.blocked && exit.to.is_some() {
                        kept.to = exit.to.take();
                        kept.portal_key = exit.portal_key.take();
                    }
                    outcome.dropped += 1;
                }
                None => {
                    self.exits.insert(id, exit);
                    outcome.rewritten += 1;
                }
            }
        }

        tracing::debug!(%from, %into, ?outcome, "merged room");
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Exits
    // -----------------------------------------------------------------------

    /// Add an exit and return its assigned id. Both ends must exist, and the
    /// source must not already have an exit in that direction.
    pub fn add_exit(&mut self, mut exit: Exit) -> MapResult<ExitId> {
        if !self.rooms.contains_key(&exit.from) {
            return Err(MapError::RoomNotFound(exit.from));
        }
        if let Some(to) = &exit.to {
            if !self.rooms.contains_key(to) {
                return Err(MapError::RoomNotFound(to.clone()));
            }
        }
        if self.exit_from(&exit.from, exit.direction).is_some() {
            return Err(MapError::DuplicateExit {
                from: exit.from,
                direction: exit.direction,
            });
        }

        self.next_exit += 1;
        let id = ExitId(self.next_exit);
        exit.id = id;
        self.exits.insert(id, exit);
        Ok(id)
    }

    /// The exit leaving `from` in `direction`.
    pub fn exit_from(&self, from: &RoomKey, direction: Direction) -> Option<&Exit> {
        self.exits
            .values()
            .find(|e| &e.from == from && e.direction == direction)
    }

    /// The exit leaving `from` in `direction`, mutably.
    pub fn exit_from_mut(&mut self, from: &RoomKey, direction: Direction) -> Option<&mut Exit> {
        self.exits
            .values_mut()
            .find(|e| &e.from == from && e.direction == direction)
    }

    /// All exits, in creation order.
    pub fn exits(&self) -> impl Iterator<Item = &Exit> {
        self.exits.values()
    }

    /// All exits, mutably.
    pub fn exits_mut(&mut self) -> impl Iterator<Item = &mut Exit> {
        self.exits.values_mut()
    }

    /// Remove every exit matching the predicate and return them.
    pub fn remove_exits_where(&mut self, mut predicate: impl FnMut(&Exit) -> bool) -> Vec<Exit> {
        let ids: Vec<ExitId> = self
            .exits
            .values()
            .filter(|e| predicate(e))
            .map(|e| e.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.exits.shift_remove(&id))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Number of rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of exits.
    pub fn exit_count(&self) -> usize {
        self.exits.len()
    }

    /// Number of rooms holding a portal key.
    pub fn portal_room_count(&self) -> usize {
        self.by_portal_key.len()
    }

    /// Number of blocked exits.
    pub fn blocked_exit_count(&self) -> usize {
        self.exits.values().filter(|e| e.blocked).count()
    }

    /// Number of rooms on a zone boundary.
    pub fn zone_exit_room_count(&self) -> usize {
        self.rooms.values().filter(|r| r.zone_exit).count()
    }

    /// Id of the most recently created exit. Exits created later have larger
    /// ids, so this marks a point in the graph's history.
    pub fn exit_watermark(&self) -> u64 {
        self.next_exit
    }

    /// Exits whose endpoints are missing from the graph. Always empty for a
    /// graph built through this API.
    pub fn dangling_exits(&self) -> Vec<&Exit> {
        self.exits
            .values()
            .filter(|e| {
                !self.rooms.contains_key(&e.from)
                    || e.to.as_ref().is_some_and(|t| !self.rooms.contains_key(t))
            })
            .collect()
    }
}
