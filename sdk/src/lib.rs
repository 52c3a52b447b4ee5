//! Logiflow SDK - Rust client library for the logistics orchestrator.
//!
//! The backend plans multi-leg parcel routes across Tamil Nadu districts,
//! records custody hand-offs and pushes order updates over WebSocket. This
//! crate is the client side of both surfaces.
//!
//! # Modules
//!
//! - [`client`] — REST client ([`OrchestratorClient`]) for catalogs,
//!   quotes, orders and custody chains
//! - [`realtime`] — self-healing WebSocket driver ([`RealtimeClient`])
//! - [`endpoints`] — process-wide backend origins ([`Endpoints::global`])
//! - [`types`] — backend record shapes
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use logiflow_sdk::realtime::{Backoff, Envelope, ReconnectPolicy};
//!
//! let frame = r#"{"type":"order_status_changed","data":{"order_id":"ORD-42","status":"delivered"},"timestamp":"2024-05-01T10:00:00"}"#;
//! let event = Envelope::decode(frame).unwrap();
//! assert_eq!(event.order_id(), Some("ORD-42"));
//!
//! let policy = ReconnectPolicy::default();
//! assert_eq!(policy.next(2), Backoff::Retry(Duration::from_secs(4)));
//! assert_eq!(policy.next(5), Backoff::GiveUp);
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod realtime;
pub mod types;

pub use client::{ClientConfig, ClientError, OrchestratorClient};
pub use endpoints::Endpoints;
pub use error::SdkError;
pub use realtime::{ConnectionStatus, Envelope, RealtimeClient, RealtimeConfig, RealtimeError};
pub use types::{
    Catalog, CustodyEvent, FailureEvent, Order, OrderRequest, OrderStatus, Priority,
    QuoteRequest, RoutePlan,
};
