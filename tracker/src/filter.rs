//! Subject filtering.
//!
//! Decides whether a notification concerns the tracked order.

use logiflow_sdk::Envelope;

/// Notification types that move a tracked order.
pub const SUBJECT_EVENT_KINDS: [&str; 2] = ["order_status_changed", "order_location_changed"];

/// Matches notifications about one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFilter {
    order_id: String,
}

impl SubjectFilter {
    /// Creates a filter for the given order.
    #[must_use]
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }

    /// Returns the tracked order ID.
    #[must_use]
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Returns true if the notification should trigger a refresh.
    #[must_use]
    pub fn matches(&self, event: &Envelope) -> bool {
        !self.order_id.is_empty()
            && SUBJECT_EVENT_KINDS.contains(&event.kind.as_str())
            && event.order_id() == Some(self.order_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, order_id: &str) -> Envelope {
        Envelope::decode(&format!(
            r#"{{"type":"{}","data":{{"order_id":"{}"}},"timestamp":"2024-05-01T10:00:00"}}"#,
            kind, order_id
        ))
        .expect("decode")
    }

    #[test]
    fn test_filter_matches_subject_events() {
        let filter = SubjectFilter::new("ORD-42");
        assert!(filter.matches(&event("order_status_changed", "ORD-42")));
        assert!(filter.matches(&event("order_location_changed", "ORD-42")));
    }

    #[test]
    fn test_filter_ignores_other_orders_and_kinds() {
        let filter = SubjectFilter::new("ORD-42");
        assert!(!filter.matches(&event("order_status_changed", "ORD-43")));
        assert!(!filter.matches(&event("order_created", "ORD-42")));
        assert!(!filter.matches(&Envelope::decode(r#"{"type":"pong"}"#).expect("decode")));
    }

    #[test]
    fn test_filter_without_subject_matches_nothing() {
        let filter = SubjectFilter::new("");
        assert!(!filter.matches(&event("order_status_changed", "")));
    }
}
