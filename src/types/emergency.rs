//! Emergency incident lifecycle models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::vehicle::{GeoLocation, VehicleType};

/// Type of emergency incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyType {
    /// Heart attack, trauma, etc.
    Medical,
    /// Building fire, vehicle fire
    Fire,
    /// Assault, robbery, active threat
    Crime,
    /// Traffic accident, collision
    Accident,
    /// Hazardous material spill/leak
    Hazmat,
    /// Trapped persons, water rescue
    Rescue,
    /// Flood, earthquake, storm
    NaturalDisaster,
}

impl std::fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmergencyType::Medical => "medical",
            EmergencyType::Fire => "fire",
            EmergencyType::Crime => "crime",
            EmergencyType::Accident => "accident",
            EmergencyType::Hazmat => "hazmat",
            EmergencyType::Rescue => "rescue",
            EmergencyType::NaturalDisaster => "natural_disaster",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle status of an emergency event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    /// Received, awaiting dispatch
    Pending,
    /// Units being assigned (or none available yet)
    Dispatching,
    /// Units en route
    Dispatched,
    /// Units on scene
    InProgress,
    /// Emergency handled
    Resolved,
    /// False alarm or duplicate
    Cancelled,
}

impl std::fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmergencyStatus::Pending => "pending",
            EmergencyStatus::Dispatching => "dispatching",
            EmergencyStatus::Dispatched => "dispatched",
            EmergencyStatus::InProgress => "in_progress",
            EmergencyStatus::Resolved => "resolved",
            EmergencyStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Severity level of the emergency (1 = low, 5 = critical)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EmergencySeverity {
    Low = 1,
    Moderate = 2,
    High = 3,
    Severe = 4,
    Critical = 5,
}

impl TryFrom<u8> for EmergencySeverity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EmergencySeverity::Low),
            2 => Ok(EmergencySeverity::Moderate),
            3 => Ok(EmergencySeverity::High),
            4 => Ok(EmergencySeverity::Severe),
            5 => Ok(EmergencySeverity::Critical),
            other => Err(format!("emergency severity must be 1-5, got {}", other)),
        }
    }
}

impl From<EmergencySeverity> for u8 {
    fn from(value: EmergencySeverity) -> Self {
        value as u8
    }
}

/// Number of each vehicle type required for an emergency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitsRequired {
    #[serde(default)]
    pub ambulances: u32,
    #[serde(default)]
    pub fire_trucks: u32,
    #[serde(default)]
    pub police: u32,
}

impl UnitsRequired {
    pub fn new(ambulances: u32, fire_trucks: u32, police: u32) -> Self {
        Self {
            ambulances,
            fire_trucks,
            police,
        }
    }

    /// Total number of units required across all types
    pub fn total(&self) -> u32 {
        self.ambulances + self.fire_trucks + self.police
    }

    /// Units required for one vehicle type
    pub fn of_type(&self, vehicle_type: VehicleType) -> u32 {
        match vehicle_type {
            VehicleType::Ambulance => self.ambulances,
            VehicleType::FireTruck => self.fire_trucks,
            VehicleType::Police => self.police,
        }
    }

    /// Default unit composition for an emergency type
    pub fn defaults_for(emergency_type: EmergencyType) -> Self {
        match emergency_type {
            EmergencyType::Medical => Self::new(1, 0, 0),
            EmergencyType::Fire => Self::new(1, 2, 0),
            EmergencyType::Crime => Self::new(0, 0, 2),
            EmergencyType::Accident => Self::new(2, 0, 1),
            EmergencyType::Hazmat => Self::new(1, 2, 1),
            EmergencyType::Rescue => Self::new(1, 1, 0),
            EmergencyType::NaturalDisaster => Self::new(2, 2, 2),
        }
    }
}

/// An emergency event requiring dispatch of one or more units.
///
/// Created when an operator registers an incident via the REST API or the
/// `aegis:emergencies:new` topic. The orchestrator owns the lifecycle:
/// `pending -> dispatching -> dispatched -> resolved`, with `cancelled`
/// reachable from any pre-resolved state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub emergency_id: String,
    pub emergency_type: EmergencyType,
    #[serde(default = "default_status")]
    pub status: EmergencyStatus,
    pub severity: EmergencySeverity,
    pub location: GeoLocation,
    /// Human-readable address, for display only
    #[serde(default)]
    pub address: Option<String>,
    pub description: String,
    pub units_required: UnitsRequired,
    /// Identifier of the operator or system that reported the incident
    #[serde(default = "default_reporter")]
    pub reported_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub dispatched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<String>,
}

fn default_reporter() -> String {
    "operator".to_string()
}

fn default_status() -> EmergencyStatus {
    EmergencyStatus::Pending
}

impl Emergency {
    /// Register a new pending emergency with a fresh UUID.
    ///
    /// `units_required` falls back to the per-type defaults when `None`.
    pub fn new(
        emergency_type: EmergencyType,
        severity: EmergencySeverity,
        location: GeoLocation,
        description: impl Into<String>,
        units_required: Option<UnitsRequired>,
    ) -> Self {
        Self {
            emergency_id: Uuid::new_v4().to_string(),
            emergency_type,
            status: EmergencyStatus::Pending,
            severity,
            location,
            address: None,
            description: description.into(),
            units_required: units_required
                .unwrap_or_else(|| UnitsRequired::defaults_for(emergency_type)),
            reported_by: default_reporter(),
            created_at: Utc::now(),
            dispatched_at: None,
            resolved_at: None,
            notes: Vec::new(),
        }
    }

    /// Whether the emergency is still open (not resolved or cancelled)
    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            EmergencyStatus::Resolved | EmergencyStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_required_totals() {
        let units = UnitsRequired::new(2, 1, 0);
        assert_eq!(units.total(), 3);
        assert_eq!(units.of_type(VehicleType::Ambulance), 2);
        assert_eq!(units.of_type(VehicleType::FireTruck), 1);
        assert_eq!(units.of_type(VehicleType::Police), 0);
    }

    #[test]
    fn test_default_units_per_emergency_type() {
        assert_eq!(
            UnitsRequired::defaults_for(EmergencyType::Medical),
            UnitsRequired::new(1, 0, 0)
        );
        assert_eq!(
            UnitsRequired::defaults_for(EmergencyType::Fire),
            UnitsRequired::new(1, 2, 0)
        );
        assert_eq!(
            UnitsRequired::defaults_for(EmergencyType::Hazmat),
            UnitsRequired::new(1, 2, 1)
        );
        assert_eq!(
            UnitsRequired::defaults_for(EmergencyType::NaturalDisaster),
            UnitsRequired::new(2, 2, 2)
        );
        // Every default requires at least one unit
        for et in [
            EmergencyType::Medical,
            EmergencyType::Fire,
            EmergencyType::Crime,
            EmergencyType::Accident,
            EmergencyType::Hazmat,
            EmergencyType::Rescue,
            EmergencyType::NaturalDisaster,
        ] {
            assert!(UnitsRequired::defaults_for(et).total() >= 1);
        }
    }

    #[test]
    fn test_severity_serde_as_integer() {
        assert_eq!(
            serde_json::to_string(&EmergencySeverity::Severe).unwrap(),
            "4"
        );
        let parsed: EmergencySeverity = serde_json::from_str("5").unwrap();
        assert_eq!(parsed, EmergencySeverity::Critical);
        assert!(serde_json::from_str::<EmergencySeverity>("6").is_err());
        assert!(serde_json::from_str::<EmergencySeverity>("0").is_err());
    }

    #[test]
    fn test_new_emergency_defaults() {
        let e = Emergency::new(
            EmergencyType::Fire,
            EmergencySeverity::High,
            GeoLocation::new(19.43, -99.13, Utc::now()),
            "Building fire",
            None,
        );
        assert_eq!(e.status, EmergencyStatus::Pending);
        assert_eq!(e.units_required, UnitsRequired::new(1, 2, 0));
        assert!(e.is_active());
        assert!(e.dispatched_at.is_none());
        assert!(e.resolved_at.is_none());
    }

    #[test]
    fn test_emergency_ids_unique() {
        let loc = GeoLocation::new(0.0, 0.0, Utc::now());
        let a = Emergency::new(
            EmergencyType::Medical,
            EmergencySeverity::High,
            loc.clone(),
            "a",
            None,
        );
        let b = Emergency::new(EmergencyType::Medical, EmergencySeverity::High, loc, "b", None);
        assert_ne!(a.emergency_id, b.emergency_id);
    }
}
