//! Persistence adapter for mapwright.
//!
//! A finished [`mw_core::MapGraph`] is flushed to a [`MapStore`]: rooms first,
//! then exits, with remote ids substituted for room keys. The REST client
//! [`HttpStore`] talks to the map service; [`MemoryStore`] keeps everything
//! in process.

/// Store connection settings.
pub mod config;
/// Error types.
pub mod error;
/// REST client.
pub mod http;
/// In-memory store.
pub mod memory;
/// Batch save.
pub mod save;
/// Store trait and payloads.
pub mod store;

pub use config::{API_URL_ENV, DEFAULT_API_URL, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use save::{SaveReport, save_graph};
pub use store::{MapStore, NewExit, NewRoom, StoreLookup};
