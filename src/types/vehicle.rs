//! Vehicle identity, operational status, and geographic position

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Type of emergency vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Ambulance,
    FireTruck,
    Police,
}

impl VehicleType {
    /// All vehicle types in dispatch-selection order
    pub const ALL: [VehicleType; 3] = [
        VehicleType::Ambulance,
        VehicleType::FireTruck,
        VehicleType::Police,
    ];

    /// Vehicle ID prefix convention for this type (`AMB-001`, `FIRE-002`, ...)
    pub fn id_prefix(self) -> &'static str {
        match self {
            VehicleType::Ambulance => "AMB",
            VehicleType::FireTruck => "FIRE",
            VehicleType::Police => "POL",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleType::Ambulance => write!(f, "ambulance"),
            VehicleType::FireTruck => write!(f, "fire_truck"),
            VehicleType::Police => write!(f, "police"),
        }
    }
}

/// Infer the vehicle type from the ID prefix convention (case-insensitive).
///
/// Unknown prefixes fall back to ambulance with a logged warning so that an
/// unrecognized vehicle still participates in the fleet.
pub fn infer_vehicle_type(vehicle_id: &str) -> VehicleType {
    let vid = vehicle_id.to_ascii_uppercase();
    if vid.starts_with("AMB") {
        VehicleType::Ambulance
    } else if vid.starts_with("FIRE") {
        VehicleType::FireTruck
    } else if vid.starts_with("POL") {
        VehicleType::Police
    } else {
        warn!(vehicle_id = %vehicle_id, "Unknown vehicle ID prefix, defaulting to ambulance");
        VehicleType::Ambulance
    }
}

/// Current operational status of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    /// Not connected to the system
    Offline,
    /// At station, ready for dispatch
    Idle,
    /// Responding to an emergency
    EnRoute,
    /// At the emergency location
    OnScene,
    /// Returning to station
    Returning,
    /// Scheduled maintenance
    Maintenance,
    /// Broken / unavailable
    OutOfService,
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationalStatus::Offline => "offline",
            OperationalStatus::Idle => "idle",
            OperationalStatus::EnRoute => "en_route",
            OperationalStatus::OnScene => "on_scene",
            OperationalStatus::Returning => "returning",
            OperationalStatus::Maintenance => "maintenance",
            OperationalStatus::OutOfService => "out_of_service",
        };
        write!(f, "{}", s)
    }
}

/// Geographic position with movement metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
    /// Altitude in meters above sea level
    #[serde(default)]
    pub altitude: f64,
    /// Direction of travel in degrees, [0, 360]
    #[serde(default)]
    pub heading: f64,
    /// Ground speed in km/h
    #[serde(default)]
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

impl GeoLocation {
    /// Stationary position at the given coordinates
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            heading: 0.0,
            speed_kmh: 0.0,
            timestamp,
        }
    }

    /// Whether all fields fall inside their declared physical ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && (0.0..=360.0).contains(&self.heading)
            && self.speed_kmh >= 0.0
            && self.latitude.is_finite()
            && self.longitude.is_finite()
    }
}
