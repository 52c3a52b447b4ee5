//! Backend endpoint configuration.
//!
//! The REST origin and the real-time origin are read from the environment
//! once per process. [`Endpoints::global`] is the single accessor; every
//! caller gets the same value and there is no runtime reconfiguration.

use std::env;
use std::sync::OnceLock;

use crate::error::SdkError;

/// Environment variable holding the REST API origin.
pub const API_URL_ENV: &str = "LOGIFLOW_API_URL";

/// Environment variable holding the real-time origin.
pub const WS_BASE_ENV: &str = "LOGIFLOW_WS_BASE";

/// Default REST API origin.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Path of the real-time endpoint under the real-time origin.
pub const REALTIME_PATH: &str = "/ws";

static GLOBAL: OnceLock<Endpoints> = OnceLock::new();

/// Origins of the orchestrator backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// REST API origin (`http://` or `https://`), without trailing slash.
    pub api_url: String,

    /// Real-time origin (`ws://` or `wss://`), without trailing slash.
    pub ws_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_base: ws_origin_for(DEFAULT_API_URL),
        }
    }
}

impl Endpoints {
    /// Creates endpoints from an API origin, deriving the real-time origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not an http(s) URL.
    pub fn new(api_url: impl Into<String>) -> Result<Self, SdkError> {
        let api_url = trim_origin(api_url.into());
        let ws_base = ws_origin_for(&api_url);
        let endpoints = Self { api_url, ws_base };
        endpoints.validate()?;
        Ok(endpoints)
    }

    /// Overrides the real-time origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not a ws(s) URL.
    pub fn with_ws_base(mut self, ws_base: impl Into<String>) -> Result<Self, SdkError> {
        self.ws_base = trim_origin(ws_base.into());
        self.validate()?;
        Ok(self)
    }

    /// Reads endpoints from the environment.
    ///
    /// `LOGIFLOW_API_URL` defaults to [`DEFAULT_API_URL`]. When
    /// `LOGIFLOW_WS_BASE` is unset the real-time origin is the API origin
    /// with its scheme switched to `ws`/`wss`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable holds an invalid origin.
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads endpoints through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is an invalid origin.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SdkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let endpoints = Self::new(api_url)?;
        match lookup(WS_BASE_ENV) {
            Some(ws_base) => endpoints.with_ws_base(ws_base),
            None => Ok(endpoints),
        }
    }

    /// Returns the process-wide endpoints, reading the environment on
    /// first use.
    ///
    /// Invalid environment values are logged and replaced by the defaults
    /// so that every caller observes the same configuration.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| match Self::from_env() {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::warn!(error = %e, "invalid endpoint environment, using defaults");
                Self::default()
            }
        })
    }

    /// Returns the full URL of the real-time endpoint.
    #[must_use]
    pub fn realtime_url(&self) -> String {
        format!("{}{}", self.ws_base, REALTIME_PATH)
    }

    /// Validates both origins.
    ///
    /// # Errors
    ///
    /// Returns an error if an origin has the wrong scheme.
    pub fn validate(&self) -> Result<(), SdkError> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(SdkError::InvalidEndpoint(self.api_url.clone()));
        }
        if !self.ws_base.starts_with("ws://") && !self.ws_base.starts_with("wss://") {
            return Err(SdkError::InvalidEndpoint(self.ws_base.clone()));
        }
        Ok(())
    }
}

fn trim_origin(mut origin: String) -> String {
    while origin.ends_with('/') {
        origin.pop();
    }
    origin
}

/// Maps an http(s) origin to the matching ws(s) origin.
fn ws_origin_for(api_url: &str) -> String {
    match api_url.strip_prefix("http") {
        Some(rest) => format!("ws{}", rest),
        None => api_url.to_string(),
    }
}
