//! Record types for the logistics orchestrator.
//!
//! All of these are owned by the backend. The SDK reads them and sends
//! requests that make the backend create or change them.

pub mod auth;
pub mod catalog;
pub mod order;
pub mod route;
pub mod tracking;

pub use auth::{RegisterRequest, Role, Token, User};
pub use catalog::{Catalog, District, Driver, MapConfig, Warehouse};
pub use order::{Order, OrderRequest, OrderStatus, StatusUpdate};
pub use route::{Priority, QuoteRequest, RoutePlan, RouteSegment};
pub use tracking::{
    Checkpoint, CheckpointKind, CustodyEvent, CustodyEventKind, CustodyParty, FailureEvent,
    FailureKind,
};

use serde::{Deserialize, Serialize};

/// Backend health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// `ok` when healthy.
    pub status: String,
}

impl Health {
    /// Returns true if the backend reports itself healthy.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
