//! etcd backend.
//!
//! Transactions map to etcd transactions without compare clauses. Watches
//! read the key at revision R, emit it, then watch from R+1 with previous
//! values enabled so deletes carry the record they removed.

use crate::backend::{KvBackend, KvEvent, KvWatch, Txn, TxnOp};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use etcd_client::{Client, EventType, Txn as EtcdTxn, TxnOp as EtcdTxnOp, WatchOptions};
use tokio::sync::mpsc;
use tracing::{debug, info};

fn unavailable(e: etcd_client::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// A [`KvBackend`] backed by an etcd cluster.
#[derive(Clone)]
pub struct EtcdBackend {
    client: Client,
}

impl EtcdBackend {
    /// Connects to the given etcd endpoints.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if no endpoint can be reached.
    pub async fn connect(endpoints: &[String]) -> StoreResult<Self> {
        let client = Client::connect(endpoints, None).await.map_err(unavailable)?;
        info!(?endpoints, "connected to etcd");
        Ok(Self { client })
    }
}

#[async_trait]
impl KvBackend for EtcdBackend {
    fn backend_name(&self) -> &'static str {
        "etcd"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut client = self.client.clone();
        let resp = client.get(key, None).await.map_err(unavailable)?;
        Ok(resp.kvs().first().map(|kv| kv.value().to_vec()))
    }

    async fn transact(&self, txn: Txn) -> StoreResult<()> {
        let ops: Vec<EtcdTxnOp> = txn
            .into_ops()
            .into_iter()
            .map(|op| match op {
                TxnOp::Put { key, value } => EtcdTxnOp::put(key, value, None),
                TxnOp::Delete { key } => EtcdTxnOp::delete(key, None),
            })
            .collect();

        let mut client = self.client.clone();
        let resp = client
            .txn(EtcdTxn::new().and_then(ops))
            .await
            .map_err(unavailable)?;
        if !resp.succeeded() {
            return Err(StoreError::TransactionFailed(
                "etcd reported the transaction as not succeeded".into(),
            ));
        }
        Ok(())
    }

    async fn watch(&self, key: &str) -> StoreResult<KvWatch> {
        let mut client = self.client.clone();
        let current = client.get(key, None).await.map_err(unavailable)?;
        let revision = current.header().map(|h| h.revision()).unwrap_or(0);

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(KvEvent::Snapshot {
            key: key.to_string(),
            value: current.kvs().first().map(|kv| kv.value().to_vec()),
        });

        let options = WatchOptions::new()
            .with_start_revision(revision + 1)
            .with_prev_key();
        let (watcher, mut stream) = client
            .watch(key, Some(options))
            .await
            .map_err(unavailable)?;

        let key = key.to_string();
        tokio::spawn(async move {
            // Dropping the watcher cancels the server-side watch.
            let _watcher = watcher;
            loop {
                let message = tokio::select! {
                    () = tx.closed() => {
                        debug!(%key, "watch receiver dropped");
                        return;
                    }
                    message = stream.message() => message,
                };
                match message {
                    Ok(Some(resp)) => {
                        if resp.canceled() {
                            let _ = tx.send(KvEvent::Error(StoreError::Backend(format!(
                                "watch canceled: {}",
                                resp.cancel_reason()
                            ))));
                            return;
                        }
                        for event in resp.events() {
                            let kv_event = match event.event_type() {
                                EventType::Put => KvEvent::Put {
                                    key: key.clone(),
                                    value: event
                                        .kv()
                                        .map(|kv| kv.value().to_vec())
                                        .unwrap_or_default(),
                                },
                                EventType::Delete => KvEvent::Delete {
                                    key: key.clone(),
                                    prev_value: event.prev_kv().map(|kv| kv.value().to_vec()),
                                },
                            };
                            if tx.send(kv_event).is_err() {
                                debug!(%key, "watch receiver dropped");
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        debug!(%key, "etcd watch stream ended");
                        return;
                    }
                    Err(e) => {
                        let _ = tx.send(KvEvent::Error(unavailable(e)));
                        return;
                    }
                }
            }
        });

        Ok(KvWatch::new(rx))
    }
}
