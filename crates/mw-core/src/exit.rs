use std::fmt;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::room::RoomKey;

/// Identifier of an exit edge, unique within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExitId(pub u64);

impl fmt::Display for ExitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed exit from one room.
///
/// A blocked exit never has a destination. A non-blocked exit without a
/// destination means the way exists but where it leads is unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    /// Edge identifier, assigned by the graph.
    pub id: ExitId,
    /// Room the exit leaves from.
    pub from: RoomKey,
    /// Room the exit leads to, when known.
    pub to: Option<RoomKey>,
    /// Direction of travel.
    pub direction: Direction,
    /// Short human-readable description.
    pub description: Option<String>,
    /// Text shown by `look <direction>`.
    pub look_description: Option<String>,
    /// A door sits in this exit.
    pub is_door: bool,
    /// Name of the door, if one was named.
    pub door_name: Option<String>,
    /// The door was reported locked.
    pub locked: bool,
    /// The exit exists but could not be traversed.
    pub blocked: bool,
    /// The two ends lie in different zones.
    pub zone_exit: bool,
    /// Portal key of the destination, when known.
    pub portal_key: Option<String>,
    /// Synthesised as the reverse of an observed move.
    pub inferred: bool,
}

impl Exit {
    /// A traversable exit between two known rooms.
    pub fn new(from: RoomKey, direction: Direction, to: RoomKey) -> Self {
        Self {
            id: ExitId(0),
            from,
            to: Some(to),
            direction,
            description: None,
            look_description: None,
            is_door: false,
            door_name: None,
            locked: false,
            blocked: false,
            zone_exit: false,
            portal_key: None,
            inferred: false,
        }
    }

    /// An exit that exists but could not be passed.
    pub fn blocked(from: RoomKey, direction: Direction) -> Self {
        Self {
            to: None,
            blocked: true,
            ..Self::new(from.clone(), direction, from)
        }
    }

    /// An exit that exists and leads somewhere not yet visited.
    pub fn unexplored(from: RoomKey, direction: Direction) -> Self {
        Self {
            to: None,
            ..Self::new(from.clone(), direction, from)
        }
    }

    /// Mark as the assumed reverse of an observed move.
    pub fn inferred(mut self) -> Self {
        self.inferred = true;
        self
    }

    /// Attach door details.
    pub fn with_door(mut self, name: Option<String>, locked: bool) -> Self {
        self.is_door = true;
        self.door_name = name;
        self.locked = locked;
        self
    }

    /// Whether this exit touches the given room at either end.
    pub fn touches(&self, key: &RoomKey) -> bool {
        &self.from == key || self.to.as_ref() == Some(key)
    }
}
