//! Entitlement server
//!
//! Serves license activation and entitlement queries over HTTP for one
//! cluster member. All members share the license record through etcd.
//!
//! Usage:
//!   entitle-server --listen 0.0.0.0:1650 --etcd-endpoint http://127.0.0.1:2379
//!
//! Without `--etcd-endpoint` the record lives in process memory.

use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use entitle_license::ActivationVerifier;
use entitle_server::{EnterpriseService, ServerArgs, ServerConfig, build_router};
use entitle_store::{EntitlementStore, KvBackend, MemoryBackend};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config();
    info!("entitle-server starting...");

    let verifier = ActivationVerifier::embedded().context("failed to load activation public key")?;
    let backend = connect_backend(&config).await?;
    let store = EntitlementStore::new(backend, &config.prefix);
    info!(backend = store.backend_name(), key = store.key(), "entitlement store ready");

    let service = Arc::new(
        EnterpriseService::start(Arc::new(verifier), store, config.backoff.clone())
            .await
            .context("failed to load entitlement state")?,
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("HTTP API listening on {}", config.listen_addr);

    axum::serve(listener, build_router(service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    service.shutdown().await;
    info!("entitle-server stopped");
    Ok(())
}

#[cfg(feature = "etcd")]
async fn connect_backend(config: &ServerConfig) -> Result<Arc<dyn KvBackend>> {
    if config.etcd_endpoints.is_empty() {
        warn!("no etcd endpoints configured; using in-memory store");
        return Ok(Arc::new(MemoryBackend::new()));
    }
    let backend = entitle_store::EtcdBackend::connect(&config.etcd_endpoints)
        .await
        .context("failed to connect to etcd")?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "etcd"))]
async fn connect_backend(config: &ServerConfig) -> Result<Arc<dyn KvBackend>> {
    if !config.etcd_endpoints.is_empty() {
        anyhow::bail!("etcd endpoints given but this build lacks the `etcd` feature");
    }
    warn!("no etcd endpoints configured; using in-memory store");
    Ok(Arc::new(MemoryBackend::new()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
