//! The map store seam and its payloads.

use mw_core::{Direction, Exit, KnownRoom, Room, RoomLookup, ZoneInfo};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Room payload for `create room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    /// Room title.
    pub name: String,
    /// Room description.
    pub description: String,
    /// Zone id, when resolved.
    pub zone_id: Option<i64>,
    /// Room sits on a zone boundary.
    pub zone_exit: bool,
    /// Terrain, when known.
    pub terrain: Option<String>,
    /// Room flags such as `no_magic`.
    pub flags: Vec<String>,
    /// Portal key, when confirmed.
    pub portal_key: Option<String>,
}

impl NewRoom {
    /// Build the payload for a graph room.
    pub fn from_room(room: &Room) -> Self {
        let mut flags = Vec::new();
        if room.no_magic {
            flags.push("no_magic".to_string());
        }
        Self {
            name: room.name.clone(),
            description: room.description.clone(),
            zone_id: room.zone_id,
            zone_exit: room.zone_exit,
            terrain: room.terrain.clone(),
            flags,
            portal_key: room.portal_key.clone(),
        }
    }
}

/// Exit payload for `create exit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExit {
    /// Remote id of the source room.
    pub from_room_id: i64,
    /// Remote id of the destination room; `None` when unknown or blocked.
    pub to_room_id: Option<i64>,
    /// Direction of travel.
    pub direction: Direction,
    /// Short description.
    pub description: Option<String>,
    /// `look <direction>` text.
    pub look_description: Option<String>,
    /// A door sits in this exit.
    pub is_door: bool,
    /// Door name.
    pub door_name: Option<String>,
    /// The exit crosses zones.
    pub is_zone_exit: bool,
}

impl NewExit {
    /// Build the payload for a graph exit once both ends have remote ids.
    pub fn from_exit(exit: &Exit, from_room_id: i64, to_room_id: Option<i64>) -> Self {
        Self {
            from_room_id,
            to_room_id,
            direction: exit.direction,
            description: exit.description.clone(),
            look_description: exit.look_description.clone(),
            is_door: exit.is_door,
            door_name: exit.door_name.clone(),
            is_zone_exit: exit.zone_exit,
        }
    }
}

/// A service that stores finished maps.
pub trait MapStore {
    /// The zone directory.
    fn zones(&self) -> StoreResult<Vec<ZoneInfo>>;

    /// Rooms already holding a portal key.
    fn find_rooms_by_portal_key(&self, portal_key: &str) -> StoreResult<Vec<KnownRoom>>;

    /// Create a room and return its remote id.
    fn create_room(&self, room: &NewRoom) -> StoreResult<i64>;

    /// Create an exit and return its remote id.
    fn create_exit(&self, exit: &NewExit) -> StoreResult<i64>;
}

/// Adapts a [`MapStore`] for the transcript engine's room lookup.
pub struct StoreLookup<'a>(pub &'a dyn MapStore);

impl RoomLookup for StoreLookup<'_> {
    fn rooms_by_portal_key(&self, portal_key: &str) -> Vec<KnownRoom> {
        self.0
            .find_rooms_by_portal_key(portal_key)
            .unwrap_or_else(|err| {
                tracing::warn!(portal_key, %err, "portal key lookup failed");
                Vec::new()
            })
    }
}
