//! License activation and entitlement query operations.

use crate::cache::{EntitlementCache, EntitlementState};
use crate::config::BackoffConfig;
use crate::error::{ServerError, ServerResult};
use crate::synchronizer::CacheSynchronizer;
use chrono::{DateTime, Utc};
use entitle_license::ActivationVerifier;
use entitle_store::{EntitlementRecord, EntitlementStore};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a state query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStateResponse {
    pub state: EntitlementState,
    /// The cached expiry. Absent when no license was ever activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// The enterprise activation service.
///
/// Activation validates and persists; state queries read only the local
/// cache, which a background [`CacheSynchronizer`] keeps current.
pub struct EnterpriseService {
    verifier: Arc<ActivationVerifier>,
    store: EntitlementStore,
    cache: Arc<EntitlementCache>,
    cancel: CancellationToken,
    synchronizer: Mutex<Option<JoinHandle<()>>>,
}

impl EnterpriseService {
    /// Seeds the cache from the store and starts the synchronizer.
    ///
    /// Fails if the initial read does not succeed.
    pub async fn start(
        verifier: Arc<ActivationVerifier>,
        store: EntitlementStore,
        backoff: BackoffConfig,
    ) -> ServerResult<Self> {
        let cache = Arc::new(EntitlementCache::new());
        match store.get().await? {
            Some(record) => {
                info!(expires = %record.expires, "loaded existing entitlement");
                cache.store(record.expires);
            }
            None => info!("no entitlement found"),
        }

        let cancel = CancellationToken::new();
        let handle =
            CacheSynchronizer::new(store.clone(), cache.clone(), backoff, cancel.clone()).spawn();

        Ok(Self {
            verifier,
            store,
            cache,
            cancel,
            synchronizer: Mutex::new(Some(handle)),
        })
    }

    /// Validates `code` and persists it as the cluster license.
    ///
    /// Returning `Ok` means the record was committed. The cache reflects it
    /// once the watch delivers the change.
    pub async fn activate(&self, code: &str) -> ServerResult<()> {
        let expires = self.verifier.validate(code).inspect_err(|e| {
            debug!(kind = e.kind(), error = %e, "rejected activation code");
        })?;

        let record = EntitlementRecord::new(code, expires);
        self.store.commit(&record).await.map_err(|e| {
            warn!(error = %e, "failed to persist entitlement");
            ServerError::Store(e)
        })?;

        info!(%expires, "license activated");
        Ok(())
    }

    /// Reports the cached licensing state.
    pub fn get_state(&self) -> GetStateResponse {
        self.get_state_at(Utc::now())
    }

    /// Reports the cached licensing state as of `now`.
    pub fn get_state_at(&self, now: DateTime<Utc>) -> GetStateResponse {
        let expires = self.cache.expiry();
        GetStateResponse {
            state: EntitlementState::from_expiry(expires, now),
            expires,
        }
    }

    /// The local snapshot the synchronizer maintains.
    pub fn cache(&self) -> &Arc<EntitlementCache> {
        &self.cache
    }

    /// The store activations are committed to.
    pub fn store(&self) -> &EntitlementStore {
        &self.store
    }

    /// Stops the synchronizer and waits for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .synchronizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "synchronizer task failed");
            }
        }
    }
}

impl Drop for EnterpriseService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
