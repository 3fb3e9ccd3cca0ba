//! Zone membership and zone-boundary marking.
//!
//! Runs once after a transcript has been parsed. Rooms observed under a zone
//! banner keep that zone; every other room belongs to the session's default
//! zone. Rooms in a non-default zone and both ends of every exit that crosses
//! zones are flagged as zone exits.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::graph::MapGraph;
use crate::room::RoomKey;

/// A zone as known to the external zone directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Directory id.
    pub id: i64,
    /// Canonical display name.
    pub name: String,
    /// Alternative names the game may display.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ZoneInfo {
    /// Whether a displayed zone name refers to this zone (case-insensitive).
    pub fn matches(&self, displayed: &str) -> bool {
        let displayed = displayed.trim();
        self.name.eq_ignore_ascii_case(displayed)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(displayed))
    }
}

/// Find the directory entry for a displayed zone name.
pub fn lookup_zone<'a>(directory: &'a [ZoneInfo], displayed: &str) -> Option<&'a ZoneInfo> {
    directory.iter().find(|z| z.matches(displayed))
}

/// The zone every unmapped room falls into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultZone {
    /// Directory id, when resolvable.
    pub id: Option<i64>,
    /// Display name, when known.
    pub name: Option<String>,
}

/// Outcome of the zone pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneReport {
    /// The zone chosen as default.
    pub default_zone: DefaultZone,
    /// Rooms explicitly mapped to a non-default zone.
    pub foreign_rooms: usize,
    /// Rooms flagged as zone exits.
    pub boundary_rooms: usize,
    /// Exits crossing between zones.
    pub boundary_exits: usize,
    /// Displayed zone names the directory did not know.
    pub unknown_zones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ZoneRef {
    Id(i64),
    Name(String),
    Unknown,
}

struct Resolver<'a> {
    directory: &'a [ZoneInfo],
    default_ref: ZoneRef,
    default_zone: DefaultZone,
    unknown: Vec<String>,
}

impl Resolver<'_> {
    /// Resolve a displayed name; unknown names fall back to the default zone.
    fn resolve(&mut self, displayed: &str) -> (ZoneRef, Option<i64>, String) {
        if self.directory.is_empty() {
            let zone_ref = ZoneRef::Name(displayed.trim().to_lowercase());
            let id = (zone_ref == self.default_ref)
                .then_some(self.default_zone.id)
                .flatten();
            return (zone_ref, id, displayed.trim().to_string());
        }
        match lookup_zone(self.directory, displayed) {
            Some(zone) => (ZoneRef::Id(zone.id), Some(zone.id), zone.name.clone()),
            None => {
                if !self.unknown.iter().any(|u| u == displayed) {
                    tracing::warn!(zone = displayed, "zone not in directory; using default zone");
                    self.unknown.push(displayed.to_string());
                }
                (
                    self.default_ref.clone(),
                    self.default_zone.id,
                    self.default_zone.name.clone().unwrap_or_default(),
                )
            }
        }
    }
}

/// Assign zone membership to every room and mark zone-boundary rooms and exits.
///
/// `observed` maps rooms to the zone banner seen while standing in them.
/// `first_zone` is the first banner of the session; `override_id` replaces it
/// as the default zone when given.
pub fn resolve_zones(
    graph: &mut MapGraph,
    observed: &IndexMap<RoomKey, String>,
    first_zone: Option<&str>,
    directory: &[ZoneInfo],
    override_id: Option<i64>,
) -> ZoneReport {
    let default_zone = match override_id {
        Some(id) => DefaultZone {
            id: Some(id),
            name: directory
                .iter()
                .find(|z| z.id == id)
                .map(|z| z.name.clone())
                .or_else(|| first_zone.map(str::to_string)),
        },
        None => {
            let found = first_zone.and_then(|name| lookup_zone(directory, name));
            DefaultZone {
                id: found.map(|z| z.id),
                name: found
                    .map(|z| z.name.clone())
                    .or_else(|| first_zone.map(str::to_string)),
            }
        }
    };
    let default_ref = match (default_zone.id, &default_zone.name) {
        (Some(id), _) if !directory.is_empty() || override_id.is_some() => ZoneRef::Id(id),
        (_, Some(name)) => ZoneRef::Name(name.trim().to_lowercase()),
        _ => ZoneRef::Unknown,
    };
    // An override with no directory still has to compare against banner names.
    let default_ref = match (&default_ref, directory.is_empty(), first_zone) {
        (ZoneRef::Id(_), true, Some(name)) => ZoneRef::Name(name.trim().to_lowercase()),
        _ => default_ref,
    };

    let mut resolver = Resolver {
        directory,
        default_ref: default_ref.clone(),
        default_zone: default_zone.clone(),
        unknown: Vec::new(),
    };

    let mut zone_of: HashMap<RoomKey, ZoneRef> = HashMap::new();
    let mut boundary: HashSet<RoomKey> = HashSet::new();
    let mut foreign_rooms = 0;

    for room in graph.rooms_mut() {
        room.zone_exit = false;
        let assigned = match observed.get(&room.key) {
            Some(displayed) => {
                let (zone_ref, id, name) = resolver.resolve(displayed);
                if zone_ref != default_ref {
                    foreign_rooms += 1;
                    boundary.insert(room.key.clone());
                }
                room.zone_id = id;
                room.zone = Some(name).filter(|n| !n.is_empty());
                zone_ref
            }
            None => {
                room.zone_id = default_zone.id;
                room.zone.clone_from(&default_zone.name);
                default_ref.clone()
            }
        };
        zone_of.insert(room.key.clone(), assigned);
    }

    let mut boundary_exits = 0;
    for exit in graph.exits_mut() {
        exit.zone_exit = false;
        let Some(to) = &exit.to else { continue };
        if zone_of.get(&exit.from) != zone_of.get(to) {
            exit.zone_exit = true;
            boundary_exits += 1;
            boundary.insert(exit.from.clone());
            boundary.insert(to.clone());
        }
    }

    for room in graph.rooms_mut() {
        if boundary.contains(&room.key) {
            room.zone_exit = true;
        }
    }

    ZoneReport {
        default_zone,
        foreign_rooms,
        boundary_rooms: boundary.len(),
        boundary_exits,
        unknown_zones: resolver.unknown,
    }
}
