//! Core map model for mapwright: rooms, exits, and the room graph.
//!
//! This crate knows nothing about transcripts. A [`MapGraph`] can be built by
//! hand, by the transcript engine, or from a JSON [`Snapshot`].

/// Compass and vertical directions.
pub mod direction;
/// Error types used throughout the crate.
pub mod error;
/// Directed exits between rooms.
pub mod exit;
/// Interfaces to remote collaborators.
pub mod external;
/// The room graph that owns rooms and exits.
pub mod graph;
/// Room identity and observed room data.
pub mod room;
/// JSON export and import.
pub mod snapshot;
/// The zone resolution pass.
pub mod zone;

/// Re-export direction type.
pub use direction::Direction;
/// Re-export error types.
pub use error::{MapError, MapResult};
/// Re-export exit types.
pub use exit::{Exit, ExitId};
/// Re-export collaborator types.
pub use external::{KnownRoom, RoomLookup};
/// Re-export graph types.
pub use graph::{MapGraph, MergeOutcome};
/// Re-export room types.
pub use room::{Room, RoomKey};
/// Re-export snapshot type.
pub use snapshot::Snapshot;
/// Re-export zone types.
pub use zone::{DefaultZone, ZoneInfo, ZoneReport, resolve_zones};
