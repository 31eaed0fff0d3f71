//! Reconnect delay policy.

use crate::client::config::BackoffConfig;
use std::time::Duration;

/// Bounded exponential backoff: `initial`, `initial * m`, `initial * m^2`, ...
/// capped at `max`, and back to `initial` after [`reset`](Backoff::reset).
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Backoff {
            config,
            current: config.initial,
        }
    }

    /// Delay to wait before the next attempt; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.config.max);
        self.current = self
            .current
            .checked_mul(self.config.multiplier.max(1))
            .unwrap_or(self.config.max)
            .min(self.config.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.config.initial;
    }
}
