//! Catalog types.
//!
//! Districts, warehouses and drivers are static reference data served by
//! the orchestrator's `/catalog` endpoints.

use serde::{Deserialize, Serialize};

/// An administrative district a parcel can be sent from or to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    /// District code (lowercase slug, e.g. `chennai`).
    pub code: String,

    /// Display name.
    pub name: String,

    /// Centroid latitude.
    pub lat: f64,

    /// Centroid longitude.
    pub lon: f64,
}

/// A warehouse (handoff checkpoint) in the routing graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    /// Warehouse ID.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Code of the district the warehouse belongs to.
    pub district_code: String,

    /// Latitude.
    pub lat: f64,

    /// Longitude.
    pub lon: f64,
}

/// A driver attached to a home warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Driver ID.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Code of the district the driver operates in.
    pub district_code: String,

    /// Vehicle type (e.g. `bike`, `van`, `truck`).
    pub vehicle_type: String,

    /// Home warehouse ID.
    pub warehouse_id: String,
}

/// Map tile configuration for rendering routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Tile URL template.
    pub tile_url: String,

    /// Tile attribution text.
    pub attribution: String,

    /// South-west and north-east corners as `[lat, lon]` pairs.
    pub bounds: Vec<[f64; 2]>,

    /// Initial zoom level.
    pub default_zoom: u8,
}

/// The full catalog, fetched once and shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// All districts.
    pub districts: Vec<District>,

    /// All warehouses.
    pub warehouses: Vec<Warehouse>,

    /// All drivers.
    pub drivers: Vec<Driver>,
}

impl Catalog {
    /// Looks up a district by code.
    #[must_use]
    pub fn district(&self, code: &str) -> Option<&District> {
        self.districts.iter().find(|d| d.code == code)
    }

    /// Returns the warehouses in a district.
    pub fn warehouses_in<'a>(
        &'a self,
        district_code: &'a str,
    ) -> impl Iterator<Item = &'a Warehouse> {
        self.warehouses
            .iter()
            .filter(move |w| w.district_code == district_code)
    }

    /// Returns the drivers based at a warehouse.
    pub fn drivers_at<'a>(&'a self, warehouse_id: &'a str) -> impl Iterator<Item = &'a Driver> {
        self.drivers
            .iter()
            .filter(move |d| d.warehouse_id == warehouse_id)
    }
}
