//! Keeps the entitlement cache in step with the store.
//!
//! A background task holds a watch on the license record and applies each
//! change to the cache. When the watch fails or closes it is re-opened after
//! an exponential backoff delay, forever, until the cancellation token fires.

use crate::backoff::ExponentialBackoff;
use crate::cache::EntitlementCache;
use crate::config::BackoffConfig;
use crate::error::SyncError;
use entitle_store::{EntitlementStore, EntitlementWatch, WatchEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Applies one watch event to the cache.
///
/// A `Snapshot` or `Put` replaces the cached expiry; an empty snapshot and
/// any `Delete` of the license record reset the cache to never-activated.
/// An `Error` is returned so the caller can re-establish the watch.
pub fn apply_watch_event(cache: &EntitlementCache, event: WatchEvent) -> Result<(), SyncError> {
    match event {
        WatchEvent::Snapshot {
            key,
            record: Some(record),
        } => {
            debug!(%key, expires = %record.expires, "entitlement snapshot loaded");
            cache.store(record.expires);
            Ok(())
        }
        WatchEvent::Snapshot { key, record: None } => {
            if let Some(cached) = cache.expiry() {
                warn!(%key, %cached, "entitlement record gone from store; resetting cache");
            }
            cache.clear();
            Ok(())
        }
        WatchEvent::Put { key, record } => {
            debug!(%key, expires = %record.expires, "entitlement updated");
            cache.store(record.expires);
            Ok(())
        }
        WatchEvent::Delete { key, record } => {
            match (record, cache.expiry()) {
                (Some(deleted), Some(cached)) if deleted.expires != cached => {
                    warn!(
                        %key,
                        deleted = %deleted.expires,
                        cached = %cached,
                        "deleted entitlement does not match cached expiry; resetting cache"
                    );
                }
                _ => warn!(%key, "entitlement record deleted; resetting cache"),
            }
            cache.clear();
            Ok(())
        }
        WatchEvent::Error(e) => Err(SyncError::Stream(e)),
    }
}

/// Background task mirroring the store's license record into the cache.
pub struct CacheSynchronizer {
    store: EntitlementStore,
    cache: Arc<EntitlementCache>,
    backoff: BackoffConfig,
    cancel: CancellationToken,
}

impl CacheSynchronizer {
    pub fn new(
        store: EntitlementStore,
        cache: Arc<EntitlementCache>,
        backoff: BackoffConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            cache,
            backoff,
            cancel,
        }
    }

    /// Runs the synchronizer on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Watches until cancelled, reconnecting with backoff on every failure.
    pub async fn run(self) {
        let mut backoff = ExponentialBackoff::new(self.backoff.clone());
        info!(key = %self.store.key(), "entitlement synchronizer started");

        loop {
            let err = match self.watch_once(&mut backoff).await {
                Ok(()) => break,
                Err(e) => e,
            };

            let delay = backoff.next_delay();
            warn!(
                error = %err,
                retry_in_ms = delay.as_millis() as u64,
                "entitlement watch interrupted; reconnecting"
            );

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!("entitlement synchronizer stopped");
    }

    /// Holds one watch until it fails. Returns `Ok` only on cancellation.
    ///
    /// The backoff is reset once the stream delivers a live change, or when
    /// it fails after staying up for at least the max interval.
    async fn watch_once(&self, backoff: &mut ExponentialBackoff) -> Result<(), SyncError> {
        let mut watch = tokio::select! {
            () = self.cancel.cancelled() => return Ok(()),
            watch = self.store.watch() => watch.map_err(SyncError::Connect)?,
        };
        debug!(key = %self.store.key(), "entitlement watch established");

        let established = Instant::now();
        let result = self.stream(&mut watch, backoff).await;
        if result.is_err() && established.elapsed() >= self.backoff.max_interval {
            backoff.reset();
        }
        result
    }

    async fn stream(
        &self,
        watch: &mut EntitlementWatch,
        backoff: &mut ExponentialBackoff,
    ) -> Result<(), SyncError> {
        loop {
            let event = tokio::select! {
                () = self.cancel.cancelled() => return Ok(()),
                event = watch.next() => event.ok_or(SyncError::Closed)?,
            };
            let live = !matches!(event, WatchEvent::Snapshot { .. });
            apply_watch_event(&self.cache, event)?;
            if live {
                backoff.reset();
            }
        }
    }
}
