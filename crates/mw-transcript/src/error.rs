//! Error types for transcript processing.

use std::path::PathBuf;

use mw_core::MapError;
use thiserror::Error;

/// Result type for transcript operations.
pub type TranscriptResult<T> = Result<T, TranscriptError>;

/// Errors that can occur while turning a transcript into a map.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// The transcript file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A graph operation broke an invariant.
    #[error(transparent)]
    Map(#[from] MapError),
}
