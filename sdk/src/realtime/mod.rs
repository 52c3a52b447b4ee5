//! Real-time notifications from the orchestrator backend.
//!
//! [`RealtimeClient`] keeps at most one WebSocket open to `<ws-base>/ws`,
//! decodes each text frame into an [`Envelope`] and hands it to an
//! [`EventHandler`]. Remote closes and failed connects are retried with
//! exponential backoff (1 s doubling, capped at 30 s, five attempts); an
//! owner-initiated [`RealtimeClient::close`] never reconnects.
//!
//! # Example
//!
//! ```rust,ignore
//! use logiflow_sdk::realtime::{ConnectionStatus, Envelope, RealtimeClient, RealtimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RealtimeConfig::from_ws_base("ws://127.0.0.1:8000");
//!     let client = RealtimeClient::connect(config, |event: &Envelope| {
//!         if event.order_id() == Some("ORD-42") {
//!             println!("{}: {:?}", event.kind, event.data);
//!         }
//!     })?;
//!
//!     client.wait_for_status(ConnectionStatus::Connected).await?;
//!     tokio::signal::ctrl_c().await?;
//!     client.close();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod policy;
pub mod status;
pub mod transport;

pub use config::RealtimeConfig;
pub use driver::{EventHandler, RealtimeClient};
pub use envelope::Envelope;
pub use error::RealtimeError;
pub use messages::{
    ClientMessage, ConnectedInfo, FeedEvent, OrderCreated, OrderLocationChanged,
    OrderStatusChanged,
};
pub use policy::{Backoff, ReconnectPolicy};
pub use status::ConnectionStatus;
pub use transport::{Connector, Transport, TransportEvent, TungsteniteConnector};
