//! The persisted entitlement record.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The unit of truth stored under the license key.
///
/// Written only by a successful activation and overwritten wholesale by
/// the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// The raw activation code that produced this record (audit trail).
    pub activation_code: String,
    /// When the entitlement ends.
    pub expires: DateTime<Utc>,
}

impl EntitlementRecord {
    /// Creates a record for a validated activation code.
    pub fn new(activation_code: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            activation_code: activation_code.into(),
            expires,
        }
    }

    /// Encodes the record into its stored form.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a stored value.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the bytes are not a valid record.
    pub fn decode(bytes: &[u8]) -> StoreResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}
