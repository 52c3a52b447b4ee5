//! Reconnect backoff policy.
//!
//! `delay(attempt) = min(base * 2^attempt, cap)`, and no delay at all once
//! `attempt` reaches the maximum.

use std::time::Duration;

/// Default delay before the first reconnect, in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1_000;

/// Default upper bound on the reconnect delay, in milliseconds.
pub const MAX_RECONNECT_DELAY_MS: u64 = 30_000;

/// Default number of reconnects scheduled before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Outcome of consulting the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Reconnect after the given delay.
    Retry(Duration),
    /// Stop reconnecting.
    GiveUp,
}

/// Exponential backoff with a cap and an attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_delay: Duration::from_millis(MAX_RECONNECT_DELAY_MS),
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(base_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts,
        }
    }

    /// Returns the attempt limit.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the capped delay for `attempt`, ignoring the attempt limit.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Decides what to do after `attempt` reconnects have been scheduled.
    #[must_use]
    pub fn next(&self, attempt: u32) -> Backoff {
        if attempt >= self.max_attempts {
            Backoff::GiveUp
        } else {
            Backoff::Retry(self.delay_for(attempt))
        }
    }
}
