//! Tracker metrics.
//!
//! Atomic counters for the tracker loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics for the order tracker.
#[derive(Debug)]
pub struct TrackerMetrics {
    /// Notifications that matched the tracked order.
    notifications_matched: AtomicU64,

    /// Snapshot fetches attempted.
    refreshes: AtomicU64,

    /// Snapshot fetches that failed.
    fetch_failures: AtomicU64,

    /// Fallback polls performed while the live feed was down.
    poll_cycles: AtomicU64,

    start_time: Instant,
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            notifications_matched: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            poll_cycles: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a notification about the tracked order.
    pub fn record_notification(&self) {
        self.notifications_matched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a snapshot fetch.
    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed snapshot fetch.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a fallback poll.
    pub fn record_poll(&self) {
        self.poll_cycles.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns matched notifications.
    #[must_use]
    pub fn notifications_matched(&self) -> u64 {
        self.notifications_matched.load(Ordering::Relaxed)
    }

    /// Returns snapshot fetches attempted.
    #[must_use]
    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Returns failed snapshot fetches.
    #[must_use]
    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    /// Returns fallback polls.
    #[must_use]
    pub fn poll_cycles(&self) -> u64 {
        self.poll_cycles.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the share of fetches that succeeded (0.0 to 1.0).
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let refreshes = self.refreshes();
        if refreshes > 0 {
            refreshes.saturating_sub(self.fetch_failures()) as f64 / refreshes as f64
        } else {
            0.0
        }
    }

    /// Returns a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> TrackerMetricsSnapshot {
        TrackerMetricsSnapshot {
            notifications_matched: self.notifications_matched(),
            refreshes: self.refreshes(),
            fetch_failures: self.fetch_failures(),
            poll_cycles: self.poll_cycles(),
            uptime: self.uptime(),
            success_rate: self.success_rate(),
        }
    }
}

/// A point-in-time snapshot of tracker metrics.
#[derive(Debug, Clone)]
pub struct TrackerMetricsSnapshot {
    /// Matched notifications.
    pub notifications_matched: u64,
    /// Snapshot fetches attempted.
    pub refreshes: u64,
    /// Failed snapshot fetches.
    pub fetch_failures: u64,
    /// Fallback polls.
    pub poll_cycles: u64,
    /// Uptime.
    pub uptime: Duration,
    /// Fetch success rate.
    pub success_rate: f64,
}
