//! Wire payloads for the pub/sub command and liveness channels
//!
//! All payloads are UTF-8 JSON with ISO-8601 UTC timestamps. Unknown fields
//! are ignored on decode; missing required fields fail the decode and the
//! message is dropped by the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::emergency::EmergencyType;
use super::vehicle::GeoLocation;

/// Liveness ping published on `aegis:{fleet}:heartbeat:{vehicle_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPing {
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub last_telemetry_sequence: u64,
}

/// Per-vehicle dispatch order published on `aegis:{fleet}:commands:{vehicle_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchCommand {
    /// Always `dispatch`; other command keys are ignored by agents
    pub command: String,
    pub emergency_id: String,
    pub emergency_type: EmergencyType,
    pub location: GeoLocation,
    pub dispatch_id: String,
}

impl DispatchCommand {
    pub const COMMAND: &'static str = "dispatch";

    pub fn new(
        emergency_id: impl Into<String>,
        emergency_type: EmergencyType,
        location: GeoLocation,
        dispatch_id: impl Into<String>,
    ) -> Self {
        Self {
            command: Self::COMMAND.to_string(),
            emergency_id: emergency_id.into(),
            emergency_type,
            location,
            dispatch_id: dispatch_id.into(),
        }
    }
}

/// Minimal probe used to route an incoming command payload before full decode
#[derive(Debug, Deserialize)]
pub struct CommandProbe {
    pub command: String,
}

/// Post-dispatch broadcast on `aegis:dispatch:{emergency_id}:assigned`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentBroadcast {
    pub emergency_id: String,
    pub dispatch_id: String,
    pub assigned_vehicles: Vec<String>,
}

/// Post-resolution broadcast on `aegis:dispatch:{emergency_id}:resolved`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionBroadcast {
    pub emergency_id: String,
    pub released_vehicles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_command_wire_shape() {
        let cmd = DispatchCommand::new(
            "em-1",
            EmergencyType::Medical,
            GeoLocation::new(19.43, -99.13, Utc::now()),
            "d-1",
        );
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "dispatch");
        assert_eq!(json["emergency_type"], "medical");
        assert!(json["location"]["latitude"].is_number());

        let back: DispatchCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let raw = r#"{"emergency_id":"em-1","released_vehicles":["AMB-001"],"extra":42}"#;
        let parsed: ResolutionBroadcast = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.released_vehicles, vec!["AMB-001"]);
    }

    #[test]
    fn test_missing_required_field_fails() {
        let raw = r#"{"released_vehicles":["AMB-001"]}"#;
        assert!(serde_json::from_str::<ResolutionBroadcast>(raw).is_err());
    }

    #[test]
    fn test_command_probe_routes_unknown_commands() {
        let raw = r#"{"command":"self_destruct","emergency_id":"em-1"}"#;
        let probe: CommandProbe = serde_json::from_str(raw).unwrap();
        assert_eq!(probe.command, "self_destruct");
    }
}
