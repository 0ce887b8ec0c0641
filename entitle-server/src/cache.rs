//! Process-local entitlement snapshot.
//!
//! A single expiry timestamp behind an atomic pointer swap. The cache
//! synchronizer is the only writer; request handlers read without locking.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Licensing state reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntitlementState {
    /// No license has ever been activated.
    None,
    /// A license is active.
    Active,
    /// The last activated license has expired.
    Expired,
}

impl EntitlementState {
    /// Derives the state from a cached expiry.
    ///
    /// An expiry equal to `now` counts as expired.
    #[must_use]
    pub fn from_expiry(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expiry {
            None => Self::None,
            Some(expiry) if expiry > now => Self::Active,
            Some(_) => Self::Expired,
        }
    }

    /// Returns true if licensed features may be used.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// The cached "current expiry". Empty means never activated.
#[derive(Debug, Default)]
pub struct EntitlementCache {
    expiry: ArcSwapOption<DateTime<Utc>>,
}

impl EntitlementCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached expiry, if any.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.load_full().map(|expiry| *expiry)
    }

    /// Replaces the cached expiry.
    pub fn store(&self, expiry: DateTime<Utc>) {
        self.expiry.store(Some(Arc::new(expiry)));
    }

    /// Resets the cache to never-activated.
    pub fn clear(&self) {
        self.expiry.store(None);
    }

    /// Returns the licensing state as of `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> EntitlementState {
        EntitlementState::from_expiry(self.expiry(), now)
    }
}
