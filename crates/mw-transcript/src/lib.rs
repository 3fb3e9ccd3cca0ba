//! Transcript engine for mapwright.
//!
//! Reads a markup-tagged game transcript line by line and builds a
//! [`mw_core::MapGraph`]: each line is stripped of markup, classified into a
//! channel, and run through an ordered rule table. Room titles start an
//! observation that the resolver maps to an existing or new room; moves and
//! their outcomes become exits; portal bind results confirm, promote, merge or
//! repair room identities after the fact.
//!
//! ```no_run
//! use mw_transcript::{Engine, EngineConfig};
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! engine.parse_file(std::path::Path::new("session.log")).unwrap();
//! let map = engine.finish(&[], None);
//! println!("{} rooms", map.graph.room_count());
//! ```

/// Engine configuration.
pub mod config;
/// The parsing driver.
pub mod engine;
/// Error types.
pub mod error;
/// Exit recording.
pub mod exits;
/// Classified transcript lines.
pub mod line;
/// Markup lexer and colour channels.
pub mod markup;
/// Portal bind handling.
pub mod portal;
/// Room identity resolution.
pub mod resolver;
/// The ordered rule table.
pub mod rules;
/// Bounded lookahead scanners.
pub mod scan;
/// Session state.
pub mod session;
/// Game phrase patterns.
pub mod vocab;

pub use config::EngineConfig;
pub use engine::{Engine, ParsedMap, parse_transcript};
pub use error::{TranscriptError, TranscriptResult};
pub use line::Line;
pub use markup::Channel;
pub use portal::BindOutcome;
pub use resolver::Resolution;
pub use rules::{BindFailure, Blockage, Event};
pub use session::{Ambiguity, ParseStats, SessionState, Sighting, Visit};
