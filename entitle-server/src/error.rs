//! Error types for the activation service.

use entitle_license::LicenseError;
use entitle_store::StoreError;
use thiserror::Error;

/// Result type for service operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors returned to callers of the service.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The activation code was rejected. Nothing was written.
    #[error("error validating activation code: {0}")]
    Validation(#[from] LicenseError),

    /// The store could not persist (or read) the record.
    #[error("could not persist entitlement: {0}")]
    Store(#[from] StoreError),
}

/// Reasons the cache synchronizer drops its watch and reconnects.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The watch could not be opened.
    #[error("could not open entitlement watch: {0}")]
    Connect(StoreError),

    /// The watch delivered an error event.
    #[error("entitlement watch failed: {0}")]
    Stream(StoreError),

    /// The watch channel closed without an error.
    #[error("entitlement watch closed unexpectedly")]
    Closed,
}
