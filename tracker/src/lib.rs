//! Logiflow Tracker - follows one order live.
//!
//! The tracker keeps an up-to-date snapshot of a single order. It listens to
//! the orchestrator's WebSocket feed and refetches the order whenever a
//! notification concerns it. While the feed is down it polls the REST API
//! on a fixed interval instead.
//!
//! # Components
//!
//! - [`config`]: Tracker configuration
//! - [`filter`]: Notification filtering
//! - [`snapshot`]: Order snapshots and their source
//! - [`service`]: Main tracker service
//! - [`probe`]: Backend connection checks
//! - [`metrics`]: Tracker metrics

pub mod config;
pub mod filter;
pub mod metrics;
pub mod probe;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, TrackerConfig};
pub use filter::SubjectFilter;
pub use metrics::{TrackerMetrics, TrackerMetricsSnapshot};
pub use probe::{CheckStatus, ConnectionProbe, ProbeCheck, ProbeReport};
pub use service::{OrderTracker, TrackerError, TrackerState};
pub use snapshot::{OrderSnapshot, OrderSource};
