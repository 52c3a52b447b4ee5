//! HTTP client for the orchestrator REST API.
//!
//! The backend is the system of record for catalogs, quotes, orders and
//! custody chains. This client reads them and asks the backend to change
//! them; it never holds authoritative state of its own.
//!
//! # Example
//!
//! ```rust,ignore
//! use logiflow_sdk::client::OrchestratorClient;
//! use logiflow_sdk::types::{OrderRequest, QuoteRequest, Priority};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrchestratorClient::with_base_url("http://127.0.0.1:8000")?;
//!
//!     let quote = QuoteRequest::new("chennai", "madurai").with_priority(Priority::Time);
//!     let plan = client.quote(&quote).await?;
//!     println!("{} hops, {} INR", plan.hops(), plan.total_cost_inr);
//!
//!     let order = client.create_order(&OrderRequest::new(quote)).await?;
//!     println!("placed {}", order.id);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::OrchestratorClient;
