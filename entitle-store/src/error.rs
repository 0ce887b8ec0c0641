//! Error types for the store adapter.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or did not reach consensus.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// A transaction was not applied.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be decoded into a record.
    #[error("could not decode entitlement record: {0}")]
    Decode(String),
}
