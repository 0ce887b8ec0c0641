//! Server configuration and command-line arguments.

use clap::Parser;
use entitle_store::DEFAULT_PREFIX;
use std::net::SocketAddr;
use std::time::Duration;

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:1650";

/// Reconnect backoff for the cache synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// First delay after a failure.
    pub initial_interval: Duration,
    /// Ceiling for the (un-jittered) delay.
    pub max_interval: Duration,
    /// Growth factor per consecutive failure.
    pub multiplier: f64,
    /// Jitter as a fraction of the interval (0.5 means ±50%).
    pub randomization_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(60),
            multiplier: 1.5,
            randomization_factor: 0.5,
        }
    }
}

/// Configuration for the entitlement server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen address.
    pub listen_addr: SocketAddr,
    /// etcd endpoints. Empty selects the in-memory store.
    pub etcd_endpoints: Vec<String>,
    /// Namespace prefix for the license record.
    pub prefix: String,
    /// Watch reconnect backoff.
    pub backoff: BackoffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 1650)),
            etcd_endpoints: Vec::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            backoff: BackoffConfig::default(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "entitle-server")]
#[command(about = "Cluster license activation and entitlement query service")]
pub struct ServerArgs {
    /// Address to serve the HTTP API on
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// etcd endpoint (repeatable). Uses an in-memory store when omitted
    #[arg(long = "etcd-endpoint")]
    pub etcd_endpoints: Vec<String>,

    /// Namespace prefix for the license record
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Initial watch reconnect delay in milliseconds
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub backoff_initial_ms: u64,

    /// Maximum watch reconnect delay in milliseconds
    #[arg(long, default_value_t = 60_000, value_parser = clap::value_parser!(u64).range(1..))]
    pub backoff_max_ms: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerArgs {
    /// Converts parsed arguments into a server configuration.
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.listen,
            etcd_endpoints: self.etcd_endpoints,
            prefix: self.prefix,
            backoff: BackoffConfig {
                initial_interval: Duration::from_millis(self.backoff_initial_ms),
                max_interval: Duration::from_millis(self.backoff_max_ms),
                ..BackoffConfig::default()
            },
        }
    }
}
