//! Room identity resolution for a fresh observation.
//!
//! Resolution never mutates the graph. It only answers which existing room,
//! if any, the observation denotes; the engine applies the answer.

use std::collections::BTreeSet;

use mw_core::{MapGraph, RoomKey};

use crate::config::EngineConfig;
use crate::scan::Observation;
use crate::vocab;

/// How an observation was matched to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Same text as a room that has no portal key yet.
    Unfingerprinted(RoomKey),
    /// Same text as several portal-keyed rooms; the exit set picked one.
    Signature(RoomKey),
    /// Same text as exactly one portal-keyed room whose exits differ.
    SoleCandidate(RoomKey),
    /// Same title and a near-identical description.
    Similar(RoomKey),
    /// Several portal-keyed rooms fit and nothing tells them apart.
    Ambiguous {
        /// The rooms that fit.
        candidates: Vec<RoomKey>,
    },
    /// Nothing fits.
    New,
}

impl Resolution {
    /// The existing room this resolution points at.
    pub fn existing(&self) -> Option<&RoomKey> {
        match self {
            Self::Unfingerprinted(k)
            | Self::Signature(k)
            | Self::SoleCandidate(k)
            | Self::Similar(k) => Some(k),
            Self::Ambiguous { .. } | Self::New => None,
        }
    }
}

/// Decide which room an observation denotes.
pub fn resolve(graph: &MapGraph, obs: &Observation, config: &EngineConfig) -> Resolution {
    let same_text = graph.rooms_with_text(&obs.name, &obs.description);

    if let Some(room) = same_text.iter().find(|r| r.portal_key.is_none()) {
        return Resolution::Unfingerprinted(room.key.clone());
    }

    if !same_text.is_empty() {
        let matching: Vec<&RoomKey> = same_text
            .iter()
            .filter(|r| r.exits == obs.exits.directions)
            .map(|r| &r.key)
            .collect();
        return match (matching.as_slice(), same_text.as_slice()) {
            ([only], _) => Resolution::Signature((*only).clone()),
            ([], [sole]) => Resolution::SoleCandidate(sole.key.clone()),
            _ => Resolution::Ambiguous {
                candidates: same_text.iter().map(|r| r.key.clone()).collect(),
            },
        };
    }

    let similar = graph
        .rooms_named(&obs.name)
        .into_iter()
        .filter(|r| r.portal_key.is_none())
        .find(|r| descriptions_match(&r.description, &obs.description, config));
    match similar {
        Some(room) => Resolution::Similar(room.key.clone()),
        None => Resolution::New,
    }
}

/// Remove clauses about who or what happens to be present, then collapse
/// whitespace.
pub fn normalize_description(text: &str) -> String {
    let mut out = text.to_string();
    for clause in vocab::DYNAMIC_CLAUSES.iter() {
        out = clause.replace_all(&out, " ").into_owned();
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity over the sets of words longer than two characters.
/// Two texts without such words are identical.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (words(a), words(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Whether two descriptions denote the same room. Short texts must match
/// exactly after normalisation.
pub fn descriptions_match(a: &str, b: &str, config: &EngineConfig) -> bool {
    let (a, b) = (normalize_description(a), normalize_description(b));
    if a.chars().count() < config.exact_match_below || b.chars().count() < config.exact_match_below
    {
        return a == b;
    }
    token_similarity(&a, &b) >= config.similarity_threshold
}
