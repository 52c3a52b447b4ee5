//! Tracker configuration.
//!
//! Provides configuration options for the order tracker.

use std::env;
use std::time::Duration;

use logiflow_sdk::{Endpoints, SdkError};

/// Environment variable holding the order to follow.
pub const ORDER_ID_ENV: &str = "LOGIFLOW_ORDER_ID";

/// Environment variable holding the fallback poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "LOGIFLOW_POLL_INTERVAL_MS";

/// Environment variable switching the polling fallback on or off.
pub const POLL_FALLBACK_ENV: &str = "LOGIFLOW_POLL_FALLBACK";

/// Default fallback poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// Configuration for the order tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Order to follow.
    pub order_id: String,

    /// Poll interval in milliseconds while the live feed is down.
    pub poll_interval_ms: u64,

    /// Whether to poll while the live feed is down.
    pub poll_fallback: bool,

    /// Backend origins.
    pub endpoints: Endpoints,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            order_id: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            poll_fallback: true,
            endpoints: Endpoints::default(),
        }
    }
}

impl TrackerConfig {
    /// Creates a configuration for the given order.
    #[must_use]
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Default::default()
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Enables or disables the polling fallback.
    #[must_use]
    pub fn with_poll_fallback(mut self, enabled: bool) -> Self {
        self.poll_fallback = enabled;
        self
    }

    /// Sets the backend origins.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let order_id = lookup(ORDER_ID_ENV)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingOrderId)?;

        let poll_interval_ms = match lookup(POLL_INTERVAL_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: POLL_INTERVAL_ENV,
                value: raw,
            })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        let poll_fallback = match lookup(POLL_FALLBACK_ENV) {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                var: POLL_FALLBACK_ENV,
                value: raw,
            })?,
            None => true,
        };

        let config = Self {
            order_id,
            poll_interval_ms,
            poll_fallback,
            endpoints: Endpoints::from_lookup(&lookup)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order_id.trim().is_empty() {
            return Err(ConfigError::MissingOrderId);
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }

        self.endpoints.validate()?;

        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// No order to follow.
    #[error("order id is required (set LOGIFLOW_ORDER_ID)")]
    MissingOrderId,

    /// Invalid poll interval.
    #[error("poll_interval_ms must be > 0")]
    InvalidPollInterval,

    /// A numeric variable did not parse.
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A boolean variable did not parse.
    #[error("{var} must be true or false, got {value:?}")]
    InvalidFlag {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// Invalid backend origin.
    #[error(transparent)]
    Endpoint(#[from] SdkError),
}
