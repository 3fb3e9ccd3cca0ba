//! Seams to services outside the mapper.

use serde::{Deserialize, Serialize};

/// A room already known to the remote map store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownRoom {
    /// Remote id.
    pub id: i64,
    /// Room title.
    pub name: String,
    /// Room description.
    #[serde(default)]
    pub description: String,
    /// Portal key the remote room holds.
    #[serde(default)]
    pub portal_key: Option<String>,
    /// Zone the remote room belongs to.
    #[serde(default)]
    pub zone_id: Option<i64>,
}

/// Look up rooms by portal key in a previously persisted map.
///
/// Used to place the very first room of a session when a portal key shows up
/// with no local bind attempt to attribute it to.
pub trait RoomLookup {
    /// Rooms holding this portal key. Errors are reported as an empty result.
    fn rooms_by_portal_key(&self, portal_key: &str) -> Vec<KnownRoom>;
}
