//! Entitlement record persistence for entitle.
//!
//! Provides a thin adapter over a replicated key-value store:
//! - [`EntitlementStore::commit`] writes the license record inside a transaction
//! - [`EntitlementStore::watch`] streams typed changes to the record
//!
//! # Backends
//!
//! - [`MemoryBackend`]: in-process, with fault injection for tests
//! - `EtcdBackend`: etcd cluster (feature `etcd`)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use entitle_store::{EntitlementStore, MemoryBackend, DEFAULT_PREFIX};
//!
//! let store = EntitlementStore::new(Arc::new(MemoryBackend::new()), DEFAULT_PREFIX);
//! assert_eq!(store.key(), "/enterprise/token");
//! ```

mod backend;
mod error;
mod memory;
mod record;
mod store;

#[cfg(feature = "etcd")]
mod etcd;

pub use backend::{KvBackend, KvEvent, KvWatch, Txn, TxnOp};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use record::EntitlementRecord;
pub use store::{DEFAULT_PREFIX, EntitlementStore, EntitlementWatch, LICENSE_KEY, WatchEvent};

#[cfg(feature = "etcd")]
pub use etcd::EtcdBackend;
