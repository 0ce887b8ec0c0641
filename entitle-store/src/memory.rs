//! In-process key-value backend.
//!
//! Serializes every transaction behind one lock and fans out change events
//! to open watches while still holding it, so all watchers observe commits
//! in the same order. Used by tests and by the server's standalone mode.
//! It also exposes fault injection hooks for exercising reconnect paths.

use crate::backend::{KvBackend, KvEvent, KvWatch, Txn, TxnOp};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

struct Watcher {
    key: String,
    tx: mpsc::UnboundedSender<KvEvent>,
}

struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    watchers: Vec<Watcher>,
    available: bool,
    revision: u64,
}

impl Inner {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory backend marked unavailable".into()))
        }
    }

    fn notify(&mut self, key: &str, make_event: impl Fn() -> KvEvent) {
        self.watchers
            .retain(|w| w.key != key || w.tx.send(make_event()).is_ok());
    }
}

/// A single-process [`KvBackend`].
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty, available backend.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                data: BTreeMap::new(),
                watchers: Vec::new(),
                available: true,
                revision: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of committed transactions.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Number of watches whose receiver is still alive.
    pub fn open_watches(&self) -> usize {
        let mut inner = self.lock();
        inner.watchers.retain(|w| !w.tx.is_closed());
        inner.watchers.len()
    }

    /// Makes every subsequent operation fail with `Unavailable` (or succeed
    /// again). Open watches are unaffected.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Delivers an `Error` event to every open watch.
    pub fn inject_watch_error(&self, message: &str) {
        let mut inner = self.lock();
        debug!(watchers = inner.watchers.len(), "injecting watch error");
        inner.watchers.retain(|w| {
            w.tx
                .send(KvEvent::Error(StoreError::Backend(message.to_string())))
                .is_ok()
        });
    }

    /// Closes every open watch channel, as a transport disconnect would.
    pub fn disconnect_watchers(&self) {
        let mut inner = self.lock();
        debug!(watchers = inner.watchers.len(), "disconnecting watchers");
        inner.watchers.clear();
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let inner = self.lock();
        inner.ensure_available()?;
        Ok(inner.data.get(key).cloned())
    }

    async fn transact(&self, txn: Txn) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.ensure_available()?;

        for op in txn.into_ops() {
            match op {
                TxnOp::Put { key, value } => {
                    inner.data.insert(key.clone(), value.clone());
                    inner.notify(&key, || KvEvent::Put {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
                TxnOp::Delete { key } => {
                    if let Some(prev) = inner.data.remove(&key) {
                        inner.notify(&key, || KvEvent::Delete {
                            key: key.clone(),
                            prev_value: Some(prev.clone()),
                        });
                    }
                }
            }
        }
        inner.revision += 1;
        Ok(())
    }

    async fn watch(&self, key: &str) -> StoreResult<KvWatch> {
        let mut inner = self.lock();
        inner.ensure_available()?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, send cannot fail.
        let _ = tx.send(KvEvent::Snapshot {
            key: key.to_string(),
            value: inner.data.get(key).cloned(),
        });
        inner.watchers.push(Watcher {
            key: key.to_string(),
            tx,
        });
        Ok(KvWatch::new(rx))
    }
}
