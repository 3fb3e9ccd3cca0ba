use crate::room::RoomKey;

/// Alias for `Result<T, MapError>`.
pub type MapResult<T> = Result<T, MapError>;

/// Errors that can occur when manipulating a room graph.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The requested room key does not exist in the graph.
    #[error("room not found: {0}")]
    RoomNotFound(RoomKey),

    /// A room with the same key already exists.
    #[error("room already exists: {0}")]
    DuplicateKey(RoomKey),

    /// Another room already holds this portal key.
    #[error("portal key {portal_key} is already bound to {holder}")]
    PortalKeyTaken {
        /// The contested portal key.
        portal_key: String,
        /// The room currently holding it.
        holder: RoomKey,
    },

    /// An exit with this source and direction already exists.
    #[error("exit {direction} from {from} already exists")]
    DuplicateExit {
        /// Source room.
        from: RoomKey,
        /// Direction of the existing exit.
        direction: crate::direction::Direction,
    },

    /// A snapshot could not be read or written.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
