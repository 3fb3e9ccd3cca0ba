use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors talking to a map store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request could not be sent or its body not decoded.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, possibly empty.
        body: String,
    },

    /// The store refused the item.
    #[error("rejected: {0}")]
    Rejected(String),
}
