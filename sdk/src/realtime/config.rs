//! Real-time connection configuration.

use std::time::Duration;

use super::error::RealtimeError;
use super::policy::{
    ReconnectPolicy, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY_MS,
    MAX_RECONNECT_DELAY_MS,
};
use crate::endpoints::{Endpoints, REALTIME_PATH};

/// Real-time connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Full endpoint URL, e.g. `ws://127.0.0.1:8000/ws`.
    pub url: String,

    /// Delay before the first reconnect.
    pub reconnect_delay: Duration,

    /// Upper bound on the reconnect delay.
    pub max_reconnect_delay: Duration,

    /// Reconnects scheduled before giving up.
    pub max_reconnect_attempts: u32,

    /// Ping interval while connected. `None` disables the heartbeat.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: Endpoints::default().realtime_url(),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_reconnect_delay: Duration::from_millis(MAX_RECONNECT_DELAY_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval: None,
        }
    }
}

impl RealtimeConfig {
    /// Creates a configuration for a full endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Creates a configuration for a real-time origin, appending `/ws`.
    #[must_use]
    pub fn from_ws_base(ws_base: &str) -> Self {
        Self::new(format!("{}{}", ws_base.trim_end_matches('/'), REALTIME_PATH))
    }

    /// Creates a configuration for the given backend endpoints.
    #[must_use]
    pub fn from_endpoints(endpoints: &Endpoints) -> Self {
        Self::new(endpoints.realtime_url())
    }

    /// Sets the initial reconnect delay.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the maximum reconnect delay.
    #[must_use]
    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    /// Sets the maximum number of scheduled reconnects.
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Enables the heartbeat.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    /// Returns the backoff policy described by this configuration.
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.reconnect_delay,
            self.max_reconnect_delay,
            self.max_reconnect_attempts,
        )
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.url.is_empty() {
            return Err(RealtimeError::InvalidConfig(
                "url cannot be empty".to_string(),
            ));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(RealtimeError::InvalidConfig(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.reconnect_delay.is_zero() {
            return Err(RealtimeError::InvalidConfig(
                "reconnect_delay must be greater than zero".to_string(),
            ));
        }

        if self.max_reconnect_delay < self.reconnect_delay {
            return Err(RealtimeError::InvalidConfig(
                "max_reconnect_delay must not be below reconnect_delay".to_string(),
            ));
        }

        if self.heartbeat_interval.is_some_and(|i| i.is_zero()) {
            return Err(RealtimeError::InvalidConfig(
                "heartbeat_interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::policy::Backoff;

    #[test]
    fn test_config_default() {
        let config = RealtimeConfig::default();
        assert_eq!(config.url, "ws://127.0.0.1:8000/ws");
        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
        assert_eq!(config.max_reconnect_attempts, 5);
        assert!(config.heartbeat_interval.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_ws_base() {
        let config = RealtimeConfig::from_ws_base("wss://track.example.com/");
        assert_eq!(config.url, "wss://track.example.com/ws");
    }

    #[test]
    fn test_config_from_endpoints() {
        let endpoints = Endpoints::new("https://api.example.com").expect("endpoints");
        let config = RealtimeConfig::from_endpoints(&endpoints);
        assert_eq!(config.url, "wss://api.example.com/ws");
    }

    #[test]
    fn test_config_builder_feeds_policy() {
        let config = RealtimeConfig::new("ws://localhost:8000/ws")
            .with_reconnect_delay(Duration::from_millis(200))
            .with_max_reconnect_delay(Duration::from_secs(1))
            .with_max_reconnect_attempts(2)
            .with_heartbeat_interval(Duration::from_secs(15));

        assert_eq!(config.heartbeat_interval, Some(Duration::from_secs(15)));
        let policy = config.reconnect_policy();
        assert_eq!(policy.next(0), Backoff::Retry(Duration::from_millis(200)));
        assert_eq!(policy.next(1), Backoff::Retry(Duration::from_millis(400)));
        assert_eq!(policy.next(2), Backoff::GiveUp);
    }

    #[test]
    fn test_config_validate_rejects_bad_values() {
        assert!(RealtimeConfig::new("").validate().is_err());
        assert!(RealtimeConfig::new("http://localhost:8000/ws")
            .validate()
            .is_err());
        assert!(RealtimeConfig::default()
            .with_reconnect_delay(Duration::ZERO)
            .validate()
            .is_err());
        assert!(RealtimeConfig::default()
            .with_max_reconnect_delay(Duration::from_millis(10))
            .validate()
            .is_err());
        assert!(RealtimeConfig::default()
            .with_heartbeat_interval(Duration::ZERO)
            .validate()
            .is_err());
    }
}
