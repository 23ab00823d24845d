//! Dispatch records and the orchestrator's live per-vehicle snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vehicle::{GeoLocation, OperationalStatus, VehicleType};

/// A single unit assigned to an emergency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedUnit {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub assigned_at: DateTime<Utc>,
    /// Whether the vehicle acknowledged the assignment
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl DispatchedUnit {
    pub fn new(vehicle_id: impl Into<String>, vehicle_type: VehicleType, assigned_at: DateTime<Utc>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            assigned_at,
            acknowledged: false,
            acknowledged_at: None,
        }
    }
}

/// Record of units dispatched to handle one emergency.
///
/// Created by the dispatcher when an emergency is processed; tracks which
/// vehicles were assigned and their acknowledgment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub dispatch_id: String,
    pub emergency_id: String,
    /// Assigned units, nearest first within each vehicle type
    pub units: Vec<DispatchedUnit>,
    pub dispatched_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// How units were selected, e.g. `nearest_available`
    pub selection_criteria: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Dispatch {
    pub fn new(emergency_id: impl Into<String>, units: Vec<DispatchedUnit>, dispatched_at: DateTime<Utc>) -> Self {
        Self {
            dispatch_id: Uuid::new_v4().to_string(),
            emergency_id: emergency_id.into(),
            units,
            dispatched_at,
            completed_at: None,
            selection_criteria: "nearest_available".to_string(),
            notes: Vec::new(),
        }
    }

    /// IDs of all vehicles in this dispatch
    pub fn vehicle_ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.vehicle_id.clone()).collect()
    }

    /// Whether every dispatched unit has acknowledged (vacuously true when empty)
    pub fn all_acknowledged(&self) -> bool {
        self.units.iter().all(|u| u.acknowledged)
    }
}

/// Real-time status snapshot of one vehicle, maintained in memory by the
/// orchestrator.
///
/// Created lazily on first telemetry from an unknown vehicle, never
/// destroyed. `vehicle_id` never changes once assigned; `operational_status`
/// transitions only via initial telemetry (idle), dispatcher assignment
/// (en_route), or dispatcher release (idle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatusSnapshot {
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    pub operational_status: OperationalStatus,
    /// Last known GPS position
    #[serde(default)]
    pub location: Option<GeoLocation>,
    /// Active emergency ID if on mission
    #[serde(default)]
    pub current_emergency_id: Option<String>,
    /// Timestamp of the last received telemetry or heartbeat
    pub last_seen_at: DateTime<Utc>,
    #[serde(default)]
    pub battery_voltage: Option<f64>,
    #[serde(default)]
    pub fuel_level_percent: Option<f64>,
    /// Sticky until explicitly acknowledged
    #[serde(default)]
    pub has_active_alert: bool,
}

impl VehicleStatusSnapshot {
    /// Auto-register a vehicle seen for the first time
    pub fn register(
        vehicle_id: impl Into<String>,
        vehicle_type: VehicleType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            operational_status: OperationalStatus::Idle,
            location: None,
            current_emergency_id: None,
            last_seen_at: now,
            battery_voltage: None,
            fuel_level_percent: None,
            has_active_alert: false,
        }
    }

    /// Whether this vehicle can be selected for dispatch.
    ///
    /// Requires idle status, no active alert, and a known location.
    pub fn is_available(&self) -> bool {
        self.operational_status == OperationalStatus::Idle
            && !self.has_active_alert
            && self.location.is_some()
    }
}
