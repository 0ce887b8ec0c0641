//! Error types for activation code validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reasons an activation code is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    /// The code or its signature is not valid base64.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The decoded code is not a `{Token, Signature}` JSON envelope.
    #[error("malformed activation code: {0}")]
    MalformedCode(String),

    /// RSA signature verification failed.
    #[error("invalid signature in activation code")]
    InvalidSignature,

    /// The signed token is not a `{Expiry}` JSON object.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The token's expiry is not an RFC 3339 timestamp.
    #[error("malformed expiry: {0}")]
    MalformedExpiry(String),

    /// The activation code expired before it was presented.
    #[error("the activation code expired at {0}")]
    AlreadyExpired(DateTime<Utc>),

    /// The verification key could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl LicenseError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEncoding(_) => "invalid_encoding",
            Self::MalformedCode(_) => "malformed_code",
            Self::InvalidSignature => "invalid_signature",
            Self::MalformedToken(_) => "malformed_token",
            Self::MalformedExpiry(_) => "malformed_expiry",
            Self::AlreadyExpired(_) => "already_expired",
            Self::InvalidPublicKey(_) => "invalid_public_key",
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
