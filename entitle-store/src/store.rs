//! Entitlement store adapter.
//!
//! Maps the single logical license record onto one key of a [`KvBackend`]
//! and decodes the backend's raw change notifications into typed events.

use crate::backend::{KvBackend, KvEvent, KvWatch, Txn};
use crate::error::{StoreError, StoreResult};
use crate::record::EntitlementRecord;
use std::sync::Arc;
use tracing::debug;

/// Default namespace for the license record.
pub const DEFAULT_PREFIX: &str = "/enterprise";

/// The fixed key (under the namespace) holding the current license.
pub const LICENSE_KEY: &str = "token";

/// A decoded change to the license record.
#[derive(Debug)]
pub enum WatchEvent {
    /// The record as of the moment the watch was opened. `None` means the
    /// key was absent.
    Snapshot {
        key: String,
        record: Option<EntitlementRecord>,
    },
    /// A record was written.
    Put {
        key: String,
        record: EntitlementRecord,
    },
    /// The record was deleted. Carries the removed record when the backend
    /// reported it.
    Delete {
        key: String,
        record: Option<EntitlementRecord>,
    },
    /// The stream failed and must be re-established.
    Error(StoreError),
}

/// Typed change stream over the license record.
#[derive(Debug)]
pub struct EntitlementWatch {
    inner: KvWatch,
}

impl EntitlementWatch {
    /// Waits for the next event.
    ///
    /// Returns `None` when the underlying channel closes. Values that fail
    /// to decode are surfaced as [`WatchEvent::Error`].
    pub async fn next(&mut self) -> Option<WatchEvent> {
        let event = self.inner.next().await?;
        Some(match event {
            KvEvent::Snapshot { key, value: None } => WatchEvent::Snapshot { key, record: None },
            KvEvent::Snapshot {
                key,
                value: Some(value),
            } => match EntitlementRecord::decode(&value) {
                Ok(record) => WatchEvent::Snapshot {
                    key,
                    record: Some(record),
                },
                Err(e) => WatchEvent::Error(e),
            },
            KvEvent::Put { key, value } => match EntitlementRecord::decode(&value) {
                Ok(record) => WatchEvent::Put { key, record },
                Err(e) => WatchEvent::Error(e),
            },
            KvEvent::Delete {
                key,
                prev_value: Some(value),
            } => match EntitlementRecord::decode(&value) {
                Ok(record) => WatchEvent::Delete {
                    key,
                    record: Some(record),
                },
                Err(e) => WatchEvent::Error(e),
            },
            KvEvent::Delete {
                key,
                prev_value: None,
            } => WatchEvent::Delete { key, record: None },
            KvEvent::Error(e) => WatchEvent::Error(e),
        })
    }
}

/// Reads, writes and watches the license record.
#[derive(Clone)]
pub struct EntitlementStore {
    backend: Arc<dyn KvBackend>,
    key: String,
}

impl EntitlementStore {
    /// Creates a store rooted at `prefix`.
    pub fn new(backend: Arc<dyn KvBackend>, prefix: &str) -> Self {
        let key = format!("{}/{LICENSE_KEY}", prefix.trim_end_matches('/'));
        Self { backend, key }
    }

    /// The full key of the license record.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backend's name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Writes `record` unconditionally inside a transaction.
    ///
    /// Never retried here; failures go straight back to the caller.
    pub async fn commit(&self, record: &EntitlementRecord) -> StoreResult<()> {
        let value = record.encode()?;
        // blind write
        self.backend
            .transact(Txn::new().put(self.key.clone(), value))
            .await?;
        debug!(key = %self.key, expires = %record.expires, "committed entitlement record");
        Ok(())
    }

    /// Reads the current record, if any.
    pub async fn get(&self) -> StoreResult<Option<EntitlementRecord>> {
        match self.backend.get(&self.key).await? {
            Some(value) => Ok(Some(EntitlementRecord::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Opens a change stream on the record.
    ///
    /// The first event is always a `Snapshot` of the current record.
    pub async fn watch(&self) -> StoreResult<EntitlementWatch> {
        let inner = self.backend.watch(&self.key).await?;
        Ok(EntitlementWatch { inner })
    }
}
