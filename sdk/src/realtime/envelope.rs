//! Inbound notification envelope.
//!
//! Every text frame the backend pushes is a JSON object
//! `{"type": …, "data": {…}, "timestamp": …}`. Frames that are not valid
//! JSON objects with a string `type` are rejected by [`Envelope::decode`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::RealtimeError;
use super::messages::{FeedEvent, OrderCreated, OrderLocationChanged, OrderStatusChanged};

/// A decoded server notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Notification type, e.g. `order_status_changed`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload. Empty when the frame carries none.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// ISO-8601 timestamp as sent by the backend.
    #[serde(default)]
    pub timestamp: String,
}

impl Envelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        data: Map<String, Value>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: timestamp.into(),
        }
    }

    /// Decodes a text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a JSON envelope.
    pub fn decode(frame: &str) -> Result<Self, RealtimeError> {
        serde_json::from_str(frame).map_err(|e| RealtimeError::Deserialization(e.to_string()))
    }

    /// Returns `data.order_id` if present and a string.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.data.get("order_id").and_then(Value::as_str)
    }

    /// Parses the timestamp. Offsets are honoured; naive values are UTC.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Returns a typed view of the notification.
    ///
    /// Unknown types map to [`FeedEvent::Other`].
    ///
    /// # Errors
    ///
    /// Returns an error if a known type carries a payload of the wrong shape.
    pub fn event(&self) -> Result<FeedEvent, RealtimeError> {
        let event = match self.kind.as_str() {
            "connected" => FeedEvent::Connected(self.payload()?),
            "order_created" => FeedEvent::OrderCreated(self.payload::<OrderCreated>()?),
            "order_status_changed" => {
                FeedEvent::OrderStatusChanged(self.payload::<OrderStatusChanged>()?)
            }
            "order_location_changed" => {
                FeedEvent::OrderLocationChanged(self.payload::<OrderLocationChanged>()?)
            }
            "pong" => FeedEvent::Pong,
            "subscribed" => FeedEvent::Subscribed {
                topic: self
                    .data
                    .get("topic")
                    .and_then(Value::as_str)
                    .unwrap_or("all")
                    .to_string(),
            },
            other => FeedEvent::Other(other.to_string()),
        };
        Ok(event)
    }

    fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, RealtimeError> {
        serde_json::from_value(Value::Object(self.data.clone()))
            .map_err(|e| RealtimeError::Deserialization(format!("{}: {}", self.kind, e)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;
    use crate::realtime::messages::ConnectedInfo;
    use crate::types::OrderStatus;

    const STATUS_FRAME: &str = r#"{"type":"order_status_changed","data":{"order_id":"ORD-42","status":"delivered"},"timestamp":"2024-05-01T10:00:00"}"#;

    #[test]
    fn test_decode_status_frame() {
        let envelope = Envelope::decode(STATUS_FRAME).expect("decode");
        assert_eq!(envelope.kind, "order_status_changed");
        assert_eq!(envelope.order_id(), Some("ORD-42"));
        assert_eq!(envelope.data.get("status"), Some(&json!("delivered")));
        assert_eq!(envelope.timestamp, "2024-05-01T10:00:00");
    }

    #[test]
    fn test_decode_pong_without_data() {
        let envelope =
            Envelope::decode(r#"{"type":"pong","timestamp":"2024-05-01T10:00:00.123456"}"#)
                .expect("decode");
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.event().expect("event"), FeedEvent::Pong);
        assert_eq!(envelope.order_id(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(Envelope::decode("not json").is_err());
        assert!(Envelope::decode("[1,2,3]").is_err());
        assert!(Envelope::decode(r#"{"data":{}}"#).is_err());
        assert!(Envelope::decode("").is_err());
    }

    #[test]
    fn test_parsed_timestamp_naive_and_offset() {
        let naive = Envelope::new("pong", Map::new(), "2024-05-01T10:00:00.250000");
        let ts = naive.parsed_timestamp().expect("naive timestamp");
        assert_eq!((ts.year(), ts.hour()), (2024, 10));

        let offset = Envelope::new("pong", Map::new(), "2024-05-01T15:30:00+05:30");
        let ts = offset.parsed_timestamp().expect("offset timestamp");
        assert_eq!(ts.hour(), 10);

        let bad = Envelope::new("pong", Map::new(), "yesterday");
        assert!(bad.parsed_timestamp().is_none());
    }

    #[test]
    fn test_event_connected_counts() {
        let frame = r#"{"type":"connected","data":{"orders_count":3,"drivers_count":12,"warehouses_count":8},"timestamp":"2024-05-01T10:00:00"}"#;
        let event = Envelope::decode(frame).expect("decode").event().expect("event");
        assert_eq!(
            event,
            FeedEvent::Connected(ConnectedInfo {
                orders_count: 3,
                drivers_count: 12,
                warehouses_count: 8,
            })
        );
    }

    #[test]
    fn test_event_status_changed() {
        let event = Envelope::decode(STATUS_FRAME).expect("decode").event().expect("event");
        match event {
            FeedEvent::OrderStatusChanged(change) => {
                assert_eq!(change.order_id, "ORD-42");
                assert_eq!(change.status, OrderStatus::Delivered);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_subscribed_and_other() {
        let mut data = Map::new();
        data.insert("topic".to_string(), json!("orders"));
        let subscribed = Envelope::new("subscribed", data, "");
        assert_eq!(
            subscribed.event().expect("event"),
            FeedEvent::Subscribed {
                topic: "orders".to_string()
            }
        );

        let other = Envelope::new("driver_moved", Map::new(), "");
        assert_eq!(
            other.event().expect("event"),
            FeedEvent::Other("driver_moved".to_string())
        );
    }

    #[test]
    fn test_event_wrong_payload_shape() {
        let envelope = Envelope::new("order_status_changed", Map::new(), "");
        assert!(matches!(
            envelope.event(),
            Err(RealtimeError::Deserialization(_))
        ));
    }
}
