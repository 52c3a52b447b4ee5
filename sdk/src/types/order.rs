//! Order types.
//!
//! Orders are created and mutated by the orchestrator. The SDK only holds
//! the shapes it reads back.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::route::{QuoteRequest, RoutePlan};

/// Default customer name for orders placed without one.
pub const DEFAULT_CUSTOMER_NAME: &str = "Walk-in";

/// Order status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order accepted, not yet picked up.
    #[default]
    Created,
    /// Parcel is moving through the route.
    InProgress,
    /// Parcel delivered.
    Delivered,
    /// A status this SDK does not know about.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Returns true if the order can no longer change.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Delivered => "delivered",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_customer_name() -> String {
    DEFAULT_CUSTOMER_NAME.to_string()
}

/// Request to place an order: a quote request plus customer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Route parameters.
    #[serde(flatten)]
    pub quote: QuoteRequest,

    /// Customer name.
    #[serde(default = "default_customer_name")]
    pub customer_name: String,

    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderRequest {
    /// Creates an order request from a quote request.
    #[must_use]
    pub fn new(quote: QuoteRequest) -> Self {
        Self {
            quote,
            customer_name: default_customer_name(),
            notes: None,
        }
    }

    /// Sets the customer name.
    #[must_use]
    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl From<QuoteRequest> for OrderRequest {
    fn from(quote: QuoteRequest) -> Self {
        Self::new(quote)
    }
}

/// An order as stored by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: String,

    /// Current status.
    #[serde(default)]
    pub status: OrderStatus,

    /// The request the order was placed with.
    pub request: OrderRequest,

    /// The route plan assigned to the order.
    pub plan: RoutePlan,
}

impl Order {
    /// Returns the origin district code.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.request.quote.origin_district
    }

    /// Returns the destination district code.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.request.quote.destination_district
    }
}

/// Acknowledgement returned by a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Server message.
    pub message: String,

    /// Updated order ID.
    pub order_id: String,

    /// New status, as sent.
    pub status: String,
}
