//! Unbounded exponential backoff with jitter.
//!
//! Each delay is the current interval randomized by
//! `± randomization_factor`; the interval then grows by `multiplier` up to
//! `max_interval`. There is no attempt limit.

use crate::config::BackoffConfig;
use rand::Rng;
use std::time::Duration;

/// Smallest interval the backoff will wait.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Tracks the next reconnect delay.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current: Duration,
}

impl ExponentialBackoff {
    /// Creates a backoff starting at the configured initial interval.
    ///
    /// Intervals are floored at [`MIN_INTERVAL`] and the max interval is
    /// never below the initial one.
    pub fn new(mut config: BackoffConfig) -> Self {
        config.initial_interval = config.initial_interval.max(MIN_INTERVAL);
        config.max_interval = config.max_interval.max(config.initial_interval);
        let current = config.initial_interval;
        Self { config, current }
    }

    /// The un-jittered interval the next delay is drawn around.
    pub fn current_interval(&self) -> Duration {
        self.current
    }

    /// Returns the next delay and advances the interval.
    pub fn next_delay(&mut self) -> Duration {
        let delay = randomize(self.current, self.config.randomization_factor);

        let multiplier = self.config.multiplier.max(1.0);
        let grown = self.current.as_secs_f64() * multiplier;
        self.current = Duration::from_secs_f64(grown.min(self.config.max_interval.as_secs_f64()));

        delay
    }

    /// Starts over from the initial interval.
    pub fn reset(&mut self) {
        self.current = self.config.initial_interval;
    }
}

fn randomize(interval: Duration, factor: f64) -> Duration {
    let factor = factor.clamp(0.0, 1.0);
    let secs = interval.as_secs_f64();
    let delta = secs * factor;
    if delta <= 0.0 {
        return interval;
    }
    let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));
    Duration::from_secs_f64(jittered)
}
