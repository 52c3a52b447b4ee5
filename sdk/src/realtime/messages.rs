//! Real-time message types.
//!
//! [`ClientMessage`] covers the frames the backend answers. [`FeedEvent`]
//! is the typed view of inbound notifications, obtained through
//! [`Envelope::event`](super::envelope::Envelope::event).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::OrderStatus;

/// Client-to-server messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Liveness probe. Answered with `pong`.
    Ping,
    /// Topic subscription. Answered with `subscribed`.
    Subscribe {
        /// Topic name. The backend treats a missing topic as `all`.
        topic: String,
    },
}

impl ClientMessage {
    /// Creates a subscription message.
    #[must_use]
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
        }
    }
}

/// Counts sent when a connection is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConnectedInfo {
    /// Orders held by the backend.
    pub orders_count: u64,
    /// Drivers in the catalog.
    pub drivers_count: u64,
    /// Warehouses in the catalog.
    pub warehouses_count: u64,
}

/// A new order was placed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderCreated {
    /// Order ID.
    pub order_id: String,
    /// Origin district code.
    pub origin: String,
    /// Destination district code.
    pub destination: String,
    /// Plan total in INR.
    pub total_cost: f64,
    /// Number of legs in the plan.
    pub segments: u32,
}

/// An order moved to a new status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderStatusChanged {
    /// Order ID.
    pub order_id: String,
    /// New status.
    pub status: OrderStatus,
}

/// An order's parcel moved. Position fields vary by producer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderLocationChanged {
    /// Order ID.
    pub order_id: String,
    /// Remaining payload fields.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Typed notification.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Connection accepted.
    Connected(ConnectedInfo),
    /// Order placed.
    OrderCreated(OrderCreated),
    /// Order status changed.
    OrderStatusChanged(OrderStatusChanged),
    /// Order location changed.
    OrderLocationChanged(OrderLocationChanged),
    /// Reply to [`ClientMessage::Ping`].
    Pong,
    /// Reply to [`ClientMessage::Subscribe`].
    Subscribed {
        /// Confirmed topic.
        topic: String,
    },
    /// Any other notification type.
    Other(String),
}

impl FeedEvent {
    /// Returns the order this event concerns, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::OrderCreated(e) => Some(&e.order_id),
            Self::OrderStatusChanged(e) => Some(&e.order_id),
            Self::OrderLocationChanged(e) => Some(&e.order_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_client_message_ping() {
        let json = serde_json::to_value(ClientMessage::Ping).expect("serialize");
        assert_eq!(json, json!({"type": "ping"}));
    }

    #[test]
    fn test_client_message_subscribe() {
        let json = serde_json::to_value(ClientMessage::subscribe("orders")).expect("serialize");
        assert_eq!(json, json!({"type": "subscribe", "topic": "orders"}));
    }

    #[test]
    fn test_location_changed_keeps_details() {
        let change: OrderLocationChanged = serde_json::from_value(json!({
            "order_id": "ORD-7",
            "lat": 13.08,
            "lon": 80.27
        }))
        .expect("deserialize");
        assert_eq!(change.order_id, "ORD-7");
        assert_eq!(change.details.get("lat"), Some(&json!(13.08)));
        assert!(!change.details.contains_key("order_id"));

        let event = FeedEvent::OrderLocationChanged(change);
        assert_eq!(event.order_id(), Some("ORD-7"));
        assert_eq!(FeedEvent::Pong.order_id(), None);
    }

    #[test]
    fn test_order_created_payload() {
        let created: OrderCreated = serde_json::from_value(json!({
            "order_id": "c0ffee",
            "origin": "chennai",
            "destination": "madurai",
            "total_cost": 912.5,
            "segments": 2
        }))
        .expect("deserialize");
        assert_eq!(created.segments, 2);
        assert!((created.total_cost - 912.5).abs() < f64::EPSILON);
    }
}
