//! Cluster license activation service.
//!
//! - [`EnterpriseService::activate`] validates an activation code and
//!   persists it to the replicated store
//! - [`EnterpriseService::get_state`] answers from a local cache that a
//!   [`CacheSynchronizer`] keeps in step with the store
//! - [`build_router`] exposes both over HTTP

pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod synchronizer;

pub use api::{ActivateRequest, ActivateResponse, ApiError, ErrorResponse, build_router};
pub use backoff::{ExponentialBackoff, MIN_INTERVAL};
pub use cache::{EntitlementCache, EntitlementState};
pub use config::{BackoffConfig, ServerArgs, ServerConfig};
pub use error::{ServerError, ServerResult, SyncError};
pub use service::{EnterpriseService, GetStateResponse};
pub use synchronizer::{CacheSynchronizer, apply_watch_event};
