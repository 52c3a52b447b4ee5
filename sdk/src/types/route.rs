//! Route quote and plan types.
//!
//! Route planning happens server-side; these are the request and plan
//! shapes exchanged with the `/quote` and `/orders` endpoints.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{Driver, Warehouse};
use crate::error::SdkError;

/// Default package type for quotes.
pub const DEFAULT_PACKAGE_TYPE: &str = "general";

/// Default maximum number of hops in a planned route.
pub const DEFAULT_MAX_HOPS: u32 = 7;

/// What the route planner optimizes for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Cheapest route.
    #[default]
    Cost,
    /// Fastest route.
    Time,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cost => write!(f, "cost"),
            Self::Time => write!(f, "time"),
        }
    }
}

impl FromStr for Priority {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cost" => Ok(Self::Cost),
            "time" | "fast" => Ok(Self::Time),
            _ => Err(SdkError::InvalidPriority(s.to_string())),
        }
    }
}

fn default_package_type() -> String {
    DEFAULT_PACKAGE_TYPE.to_string()
}

const fn default_max_hops() -> u32 {
    DEFAULT_MAX_HOPS
}

/// Request for a route quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Origin district code.
    pub origin_district: String,

    /// Destination district code.
    pub destination_district: String,

    /// Package type.
    #[serde(default = "default_package_type")]
    pub package_type: String,

    /// Optimization priority.
    #[serde(default)]
    pub priority: Priority,

    /// Preferred vehicle type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_vehicle: Option<String>,

    /// Maximum number of hops.
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    /// Seed for the planner's simulated conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl QuoteRequest {
    /// Creates a quote request between two districts with default options.
    #[must_use]
    pub fn new(
        origin_district: impl Into<String>,
        destination_district: impl Into<String>,
    ) -> Self {
        Self {
            origin_district: origin_district.into(),
            destination_district: destination_district.into(),
            package_type: default_package_type(),
            priority: Priority::default(),
            preferred_vehicle: None,
            max_hops: DEFAULT_MAX_HOPS,
            seed: None,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the package type.
    #[must_use]
    pub fn with_package_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = package_type.into();
        self
    }

    /// Sets the preferred vehicle type.
    #[must_use]
    pub fn with_preferred_vehicle(mut self, vehicle: impl Into<String>) -> Self {
        self.preferred_vehicle = Some(vehicle.into());
        self
    }

    /// Sets the maximum number of hops.
    #[must_use]
    pub fn with_max_hops(mut self, max_hops: u32) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Sets the planner seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One leg of a planned route, carried by a single driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Departure warehouse.
    #[serde(rename = "from")]
    pub from_warehouse: Warehouse,

    /// Arrival warehouse.
    #[serde(rename = "to")]
    pub to_warehouse: Warehouse,

    /// Vehicle type used on this leg.
    pub vehicle_type: String,

    /// Assigned driver.
    pub driver: Driver,

    /// Leg distance in kilometres.
    pub distance_km: f64,

    /// Estimated travel time in minutes.
    pub eta_minutes: f64,

    /// Leg cost in INR.
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_inr: Decimal,

    /// Name of the checkpoint where custody is handed off.
    pub handoff_checkpoint: String,
}

/// A complete route plan produced by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Priority the plan was optimized for.
    pub priority: Priority,

    /// Fuel price index applied to costs.
    pub fuel_index: f64,

    /// Total cost in INR.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost_inr: Decimal,

    /// Total estimated travel time in minutes.
    pub total_eta_minutes: f64,

    /// Total distance in kilometres.
    pub total_distance_km: f64,

    /// Checkpoint names along the route, in order.
    pub checkpoints: Vec<String>,

    /// Route legs, in order.
    pub segments: Vec<RouteSegment>,
}

impl RoutePlan {
    /// Returns the number of hops (legs) in the plan.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.segments.len()
    }

    /// Returns the sum of the leg costs.
    ///
    /// The server rounds `total_cost_inr`, so this can differ from it in
    /// the last decimal place.
    #[must_use]
    pub fn segment_cost_sum(&self) -> Decimal {
        self.segments.iter().map(|s| s.cost_inr).sum()
    }

    /// Returns the distinct drivers involved, in route order.
    #[must_use]
    pub fn driver_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            if !ids.contains(&segment.driver.id.as_str()) {
                ids.push(segment.driver.id.as_str());
            }
        }
        ids
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A two-leg plan as the orchestrator returns it.
    pub(crate) const PLAN_JSON: &str = r#"{
        "priority": "cost",
        "fuel_index": 1.04,
        "total_cost_inr": 912.5,
        "total_eta_minutes": 340.0,
        "total_distance_km": 452.3,
        "checkpoints": ["Chennai Hub 1", "Trichy Hub 2", "Madurai Hub 1"],
        "segments": [
            {
                "from": {"id": "WH-CHE-1", "name": "Chennai Hub 1", "district_code": "chennai", "lat": 13.08, "lon": 80.27},
                "to": {"id": "WH-TRI-2", "name": "Trichy Hub 2", "district_code": "tiruchirappalli", "lat": 10.79, "lon": 78.70},
                "vehicle_type": "truck",
                "driver": {"id": "DRV-7", "name": "Kumar", "district_code": "chennai", "vehicle_type": "truck", "warehouse_id": "WH-CHE-1"},
                "distance_km": 320.1,
                "eta_minutes": 240.0,
                "cost_inr": 640.0,
                "handoff_checkpoint": "Trichy Hub 2"
            },
            {
                "from": {"id": "WH-TRI-2", "name": "Trichy Hub 2", "district_code": "tiruchirappalli", "lat": 10.79, "lon": 78.70},
                "to": {"id": "WH-MAD-1", "name": "Madurai Hub 1", "district_code": "madurai", "lat": 9.92, "lon": 78.11},
                "vehicle_type": "van",
                "driver": {"id": "DRV-9", "name": "Priya", "district_code": "tiruchirappalli", "vehicle_type": "van", "warehouse_id": "WH-TRI-2"},
                "distance_km": 132.2,
                "eta_minutes": 100.0,
                "cost_inr": 272.5,
                "handoff_checkpoint": "Madurai Hub 1"
            }
        ]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_str() {
        assert_eq!("cost".parse::<Priority>(), Ok(Priority::Cost));
        assert_eq!("TIME".parse::<Priority>(), Ok(Priority::Time));
        assert_eq!("fast".parse::<Priority>(), Ok(Priority::Time));
        assert!("cheapest".parse::<Priority>().is_err());
    }

    #[test]
    fn test_quote_request_defaults_on_wire() {
        let json = serde_json::to_value(QuoteRequest::new("chennai", "madurai")).expect("serialize");
        assert_eq!(json["package_type"], "general");
        assert_eq!(json["priority"], "cost");
        assert_eq!(json["max_hops"], 7);
        assert!(json.get("seed").is_none());
        assert!(json.get("preferred_vehicle").is_none());
    }

    #[test]
    fn test_quote_request_builder() {
        let request = QuoteRequest::new("chennai", "madurai")
            .with_priority(Priority::Time)
            .with_preferred_vehicle("van")
            .with_max_hops(3)
            .with_seed(2025);

        assert_eq!(request.priority, Priority::Time);
        assert_eq!(request.preferred_vehicle.as_deref(), Some("van"));
        assert_eq!(request.max_hops, 3);
        assert_eq!(request.seed, Some(2025));
    }

    #[test]
    fn test_route_plan_deserialize() {
        let plan: RoutePlan = serde_json::from_str(fixtures::PLAN_JSON).expect("deserialize");
        assert_eq!(plan.priority, Priority::Cost);
        assert_eq!(plan.hops(), 2);
        assert_eq!(plan.total_cost_inr, Decimal::new(9125, 1));
        assert_eq!(plan.segment_cost_sum(), Decimal::new(9125, 1));
        assert_eq!(plan.segments[0].from_warehouse.id, "WH-CHE-1");
        assert_eq!(plan.driver_ids(), vec!["DRV-7", "DRV-9"]);
    }

    #[test]
    fn test_route_segment_uses_wire_names() {
        let plan: RoutePlan = serde_json::from_str(fixtures::PLAN_JSON).expect("deserialize");
        let json = serde_json::to_value(&plan.segments[1]).expect("serialize");
        assert_eq!(json["from"]["id"], "WH-TRI-2");
        assert_eq!(json["to"]["id"], "WH-MAD-1");
        assert!(json.get("from_warehouse").is_none());
    }
}
