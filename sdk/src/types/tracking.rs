//! Custody-chain and failure records shown when tracking an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of place a parcel can rest at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    /// Warehouse.
    Warehouse,
    /// Drop box.
    Dropbox,
    /// Partner store.
    PartnerStore,
    /// Parcel locker.
    Locker,
    /// Gas station.
    GasStation,
}

/// A custody checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint ID.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Checkpoint kind.
    #[serde(rename = "type")]
    pub kind: CheckpointKind,

    /// Latitude.
    pub lat: f64,

    /// Longitude.
    pub lon: f64,

    /// City the checkpoint is in.
    pub city: String,

    /// Parcel capacity.
    pub capacity: u32,

    /// Whether the checkpoint currently accepts parcels.
    pub available: bool,
}

/// What happened to custody of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyEventKind {
    /// Picked up from the sender.
    Pickup,
    /// Handed from one carrier to the next.
    Handoff,
    /// Stashed at a checkpoint after a failure.
    Stash,
    /// Recovered from a stash.
    Recovery,
    /// Delivered to the recipient.
    Delivery,
}

/// An entity that holds custody (driver, checkpoint, customer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyParty {
    /// Entity ID.
    pub id: String,

    /// Display name.
    pub name: String,
}

/// One link in an order's custody chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustodyEvent {
    /// Event ID.
    pub id: String,

    /// Order ID.
    pub order_id: String,

    /// Route segment the event belongs to, if any.
    #[serde(default)]
    pub segment_id: Option<String>,

    /// Event kind.
    #[serde(rename = "type")]
    pub kind: CustodyEventKind,

    /// Previous holder (absent for pickups).
    #[serde(default)]
    pub from_entity: Option<CustodyParty>,

    /// New holder.
    pub to_entity: CustodyParty,

    /// Where the transfer happened.
    pub checkpoint: Checkpoint,

    /// When the transfer happened.
    pub timestamp: DateTime<Utc>,

    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,

    /// Whether both parties confirmed the transfer.
    #[serde(default)]
    pub verified: bool,
}

/// Cause of a delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Assigned provider went offline.
    ProviderUnavailable,
    /// Vehicle broke down.
    VehicleBreakdown,
    /// Weather stopped the leg.
    Weather,
    /// Destination checkpoint was closed.
    CheckpointClosed,
    /// Anything else.
    Other,
}

/// A failure on one segment of an order's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    /// Failure ID.
    pub id: String,

    /// Order ID.
    pub order_id: String,

    /// Segment that failed.
    pub segment_id: String,

    /// Failure cause.
    #[serde(rename = "type")]
    pub kind: FailureKind,

    /// Description.
    pub description: String,

    /// When the failure was reported.
    pub timestamp: DateTime<Utc>,

    /// Whether the failure has been resolved.
    #[serde(default)]
    pub resolved: bool,

    /// How it was resolved.
    #[serde(default)]
    pub resolution: Option<String>,

    /// Where the parcel was stashed, if it was.
    #[serde(default)]
    pub stashed_at: Option<Checkpoint>,

    /// When the parcel was recovered from the stash.
    #[serde(default)]
    pub recovered_at: Option<DateTime<Utc>>,
}

impl FailureEvent {
    /// Returns true if the parcel is currently sitting in a stash.
    #[must_use]
    pub fn is_stashed(&self) -> bool {
        self.stashed_at.is_some() && self.recovered_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKPOINT: &str = r#"{
        "id": "CP-3", "name": "Trichy Locker", "type": "locker",
        "lat": 10.8, "lon": 78.7, "city": "Tiruchirappalli",
        "capacity": 40, "available": true
    }"#;

    #[test]
    fn test_custody_event_deserialize() {
        let json = format!(
            r#"{{
                "id": "CE-1", "order_id": "ORD-42", "type": "handoff",
                "from_entity": {{"id": "DRV-7", "name": "Kumar"}},
                "to_entity": {{"id": "DRV-9", "name": "Priya"}},
                "checkpoint": {},
                "timestamp": "2024-01-01T10:30:00Z",
                "verified": true
            }}"#,
            CHECKPOINT
        );
        let event: CustodyEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event.kind, CustodyEventKind::Handoff);
        assert_eq!(event.checkpoint.kind, CheckpointKind::Locker);
        assert!(event.segment_id.is_none());
        assert_eq!(
            event.from_entity.as_ref().map(|p| p.id.as_str()),
            Some("DRV-7")
        );
        assert!(event.verified);
    }

    #[test]
    fn test_failure_event_stash_state() {
        let json = format!(
            r#"{{
                "id": "F-1", "order_id": "ORD-42", "segment_id": "SEG-2",
                "type": "vehicle_breakdown", "description": "flat tyre",
                "timestamp": "2024-01-01T12:00:00Z",
                "stashed_at": {}
            }}"#,
            CHECKPOINT
        );
        let mut failure: FailureEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(failure.kind, FailureKind::VehicleBreakdown);
        assert!(!failure.resolved);
        assert!(failure.is_stashed());

        failure.recovered_at = Some(failure.timestamp);
        assert!(!failure.is_stashed());
    }
}
