//! Key-value backend abstraction.
//!
//! Defines the narrow interface the entitlement store needs from the
//! replicated key-value store: point reads, atomic transactions and a
//! change watch on a single key.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A single operation inside a [`Txn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxnOp {
    /// Write `value` under `key`, replacing any previous value.
    Put { key: String, value: Vec<u8> },
    /// Remove `key` if present.
    Delete { key: String },
}

/// An ordered list of operations applied atomically.
///
/// No compare clauses: every transaction is unconditional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Txn {
    ops: Vec<TxnOp>,
}

impl Txn {
    /// Creates an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a put.
    #[must_use]
    pub fn put(mut self, key: impl Into<String>, value: Vec<u8>) -> Self {
        self.ops.push(TxnOp::Put {
            key: key.into(),
            value,
        });
        self
    }

    /// Appends a delete.
    #[must_use]
    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(TxnOp::Delete { key: key.into() });
        self
    }

    /// Returns the operations in order.
    pub fn ops(&self) -> &[TxnOp] {
        &self.ops
    }

    /// Consumes the transaction, returning its operations.
    pub fn into_ops(self) -> Vec<TxnOp> {
        self.ops
    }
}

/// A raw change notification from the backend.
#[derive(Debug)]
pub enum KvEvent {
    /// The key's value when the watch was opened. `None` if absent.
    Snapshot {
        key: String,
        value: Option<Vec<u8>>,
    },
    /// The key was written.
    Put { key: String, value: Vec<u8> },
    /// The key was removed. Carries the value it held, when known.
    Delete {
        key: String,
        prev_value: Option<Vec<u8>>,
    },
    /// The watch failed; no further events should be expected.
    Error(StoreError),
}

/// A live stream of [`KvEvent`]s for one key.
///
/// The stream ends (returns `None`) when the backend drops the watch,
/// e.g. on transport disconnect.
#[derive(Debug)]
pub struct KvWatch {
    rx: mpsc::UnboundedReceiver<KvEvent>,
}

impl KvWatch {
    /// Wraps the receiving end of a backend's event channel.
    pub fn new(rx: mpsc::UnboundedReceiver<KvEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next event. Returns `None` once the channel closes.
    pub async fn next(&mut self) -> Option<KvEvent> {
        self.rx.recv().await
    }
}

/// A replicated key-value store.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Returns the name of the backend (for logs).
    fn backend_name(&self) -> &'static str;

    /// Reads the current value of `key`.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Applies all operations atomically.
    async fn transact(&self, txn: Txn) -> StoreResult<()>;

    /// Opens a watch on `key`.
    ///
    /// The first event is always a `Snapshot` of the key, present or not.
    /// Later events follow commit order.
    async fn watch(&self, key: &str) -> StoreResult<KvWatch>;
}
