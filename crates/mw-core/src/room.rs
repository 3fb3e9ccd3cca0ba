use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::direction::Direction;

const PORTAL_PREFIX: &str = "pk:";

/// Canonical identity of a room inside one mapping session.
///
/// A key is either a name+description composite (`Corridor#1a2b3c4d`, with a
/// `~N` suffix when the composite was issued before) or derived from the
/// room's portal key (`pk:abc123`). Never both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// The un-suffixed composite key for a name and description.
    pub fn composite_base(name: &str, description: &str) -> String {
        let digest = Sha256::digest(description.as_bytes());
        format!("{name}#{}", &hex::encode(digest)[..8])
    }

    /// A composite key; `ordinal` 1 is the bare base, later issues get `~N`.
    pub fn composite(name: &str, description: &str, ordinal: u32) -> Self {
        let base = Self::composite_base(name, description);
        if ordinal <= 1 {
            Self(base)
        } else {
            Self(format!("{base}~{ordinal}"))
        }
    }

    /// The key derived from a confirmed portal key.
    pub fn portal(portal_key: &str) -> Self {
        Self(format!("{PORTAL_PREFIX}{portal_key}"))
    }

    /// Wrap an already-formatted key (used when importing snapshots).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Whether this key was derived from a portal key.
    pub fn is_portal(&self) -> bool {
        self.0.starts_with(PORTAL_PREFIX)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room observed in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Canonical identity.
    pub key: RoomKey,
    /// Room title as displayed.
    pub name: String,
    /// Description text (body lines before the exit list, space-joined).
    pub description: String,
    /// Exit directions the room announced. Not graph edges.
    pub exits: BTreeSet<Direction>,
    /// NPCs seen here over all visits.
    pub npcs: Vec<String>,
    /// Items seen here over all visits.
    pub items: Vec<String>,
    /// Resolved zone id, filled in by the zone pass.
    pub zone_id: Option<i64>,
    /// Zone name the room was assigned to.
    pub zone: Option<String>,
    /// Confirmed portal key, if any.
    pub portal_key: Option<String>,
    /// Room sits on a zone boundary.
    pub zone_exit: bool,
    /// Portal binding is impossible here.
    pub no_magic: bool,
    /// Terrain type, when known.
    pub terrain: Option<String>,
}

impl Room {
    /// Create a room with the given identity and text.
    pub fn new(key: RoomKey, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            description: description.into(),
            exits: BTreeSet::new(),
            npcs: Vec::new(),
            items: Vec::new(),
            zone_id: None,
            zone: None,
            portal_key: None,
            zone_exit: false,
            no_magic: false,
            terrain: None,
        }
    }

    /// Set the announced exit directions.
    pub fn with_exits(mut self, exits: impl IntoIterator<Item = Direction>) -> Self {
        self.exits = exits.into_iter().collect();
        self
    }

    /// Whether this room shows the same title and description.
    pub fn same_text(&self, name: &str, description: &str) -> bool {
        self.name == name && self.description == description
    }

    /// Union another observation's exits, NPCs and items into this room.
    /// Nothing is ever removed.
    pub fn absorb(
        &mut self,
        exits: &BTreeSet<Direction>,
        npcs: &[String],
        items: &[String],
    ) {
        self.exits.extend(exits.iter().copied());
        union_into(&mut self.npcs, npcs);
        union_into(&mut self.items, items);
    }
}

fn union_into(target: &mut Vec<String>, incoming: &[String]) {
    for value in incoming {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_is_stable_and_suffixed() {
        let a = RoomKey::composite("Corridor", "A long corridor.", 1);
        let b = RoomKey::composite("Corridor", "A long corridor.", 1);
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("Corridor#"));
        assert!(!a.is_portal());

        let third = RoomKey::composite("Corridor", "A long corridor.", 3);
        assert_eq!(third.as_str(), format!("{a}~3"));
    }

    #[test]
    fn different_descriptions_give_different_keys() {
        let a = RoomKey::composite("Corridor", "A long corridor.", 1);
        let b = RoomKey::composite("Corridor", "A short corridor.", 1);
        assert_ne!(a, b);
    }

    #[test]
    fn portal_key_prefix() {
        let key = RoomKey::portal("qx7f");
        assert!(key.is_portal());
        assert_eq!(key.to_string(), "pk:qx7f");
    }

    #[test]
    fn absorb_unions_without_shrinking() {
        let mut room = Room::new(RoomKey::portal("a"), "Hall", "")
            .with_exits([Direction::North]);
        room.npcs.push("a guard".into());
        room.absorb(
            &[Direction::South].into_iter().collect(),
            &["a guard".to_string(), "a cat".to_string()],
            &[],
        );
        assert_eq!(room.exits.len(), 2);
        assert_eq!(room.npcs, vec!["a guard", "a cat"]);
    }

    proptest::proptest! {
        #[test]
        fn composite_keys_never_look_like_portal_keys(
            name in "[A-Za-z ]{1,20}",
            description in ".{0,60}",
            ordinal in 1u32..20,
        ) {
            let key = RoomKey::composite(&name, &description, ordinal);
            proptest::prop_assert!(!key.is_portal());
            proptest::prop_assert!(key.as_str().starts_with(&RoomKey::composite_base(&name, &description)));
        }
    }
}
