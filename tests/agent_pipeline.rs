//! Agent Pipeline Integration Tests
//!
//! Run real vehicle agents against a real orchestrator over the in-memory
//! bus and verify the full loop: telemetry ingestion and auto-registration,
//! failure injection flowing into alerts and fleet availability, and the
//! bidirectional command flow (dispatch command out, resolution broadcast
//! back).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use aegis_fleet::agent::VehicleAgent;
use aegis_fleet::config::{AgentConfig, OrchestratorConfig};
use aegis_fleet::orchestrator::{Orchestrator, OrchestratorHandle};
use aegis_fleet::transport::{topics, InMemoryBus, Transport};
use aegis_fleet::types::{
    Emergency, EmergencySeverity, EmergencyType, GeoLocation, OperationalStatus, UnitsRequired,
    VehicleType,
};

async fn start_stack() -> (Arc<InMemoryBus>, OrchestratorHandle, CancellationToken) {
    let bus = Arc::new(InMemoryBus::new());
    let (orchestrator, handle) = Orchestrator::new(OrchestratorConfig::default(), bus.clone());
    let cancel = CancellationToken::new();
    tokio::spawn(orchestrator.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    (bus, handle, cancel)
}

fn fast_agent_config(vehicle_id: &str, vehicle_type: VehicleType) -> AgentConfig {
    AgentConfig::new(vehicle_id, vehicle_type)
        .with_position(19.44, -99.14)
        .with_frequency(10.0)
        .with_seed(11)
}

async fn wait_until<F, Fut>(mut predicate: F, what: &str)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if predicate().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

#[tokio::test]
async fn test_agent_telemetry_registers_vehicle() {
    let (bus, handle, cancel) = start_stack().await;

    let agent = VehicleAgent::new(
        fast_agent_config("AMB-001", VehicleType::Ambulance),
        bus.clone() as Arc<dyn Transport>,
    );
    tokio::spawn(agent.run(cancel.clone()));

    wait_until(
        || {
            let handle = handle.clone();
            async move {
                let view = handle.fleet_view().await.unwrap();
                view.vehicles
                    .iter()
                    .any(|v| v.vehicle_id == "AMB-001" && v.is_available())
            }
        },
        "agent registration",
    )
    .await;

    let view = handle.fleet_view().await.unwrap();
    let snap = view
        .vehicles
        .iter()
        .find(|v| v.vehicle_id == "AMB-001")
        .unwrap();
    assert_eq!(snap.vehicle_type, VehicleType::Ambulance);
    assert_eq!(snap.operational_status, OperationalStatus::Idle);
    assert!(snap.location.is_some());
    assert!(snap.battery_voltage.is_some());
    assert!(snap.fuel_level_percent.is_some());

    cancel.cancel();
}

#[tokio::test]
async fn test_alert_flags_vehicle_and_blocks_dispatch() {
    let (bus, handle, cancel) = start_stack().await;

    let agent = VehicleAgent::new(
        fast_agent_config("AMB-001", VehicleType::Ambulance),
        bus.clone() as Arc<dyn Transport>,
    );
    tokio::spawn(agent.run(cancel.clone()));

    wait_until(
        || {
            let handle = handle.clone();
            async move {
                let view = handle.fleet_view().await.unwrap();
                view.vehicles.iter().any(|v| v.is_available())
            }
        },
        "agent registration",
    )
    .await;

    // Publish a critical alert on the vehicle's alert channel, exactly as
    // its anomaly detector would
    let alert = serde_json::json!({
        "alert_id": "a-1",
        "vehicle_id": "AMB-001",
        "timestamp": Utc::now(),
        "severity": "critical",
        "category": "fuel",
        "component": "fuel_system",
        "failure_probability": 0.95,
        "confidence": 0.98,
        "predicted_failure_min_hours": 0.1,
        "predicted_failure_likely_hours": 0.25,
        "predicted_failure_max_hours": 0.5,
        "can_complete_current_mission": false,
        "safe_to_operate": false,
        "recommended_action": "refuel",
        "contributing_factors": [],
        "related_telemetry": {}
    });
    bus.publish(&topics::alerts("fleet01", "AMB-001"), &alert.to_string())
        .await
        .unwrap();

    wait_until(
        || {
            let handle = handle.clone();
            async move {
                let view = handle.fleet_view().await.unwrap();
                view.vehicles
                    .iter()
                    .any(|v| v.vehicle_id == "AMB-001" && v.has_active_alert)
            }
        },
        "alert flag",
    )
    .await;

    let emergency = Emergency::new(
        EmergencyType::Medical,
        EmergencySeverity::High,
        GeoLocation::new(19.43, -99.13, Utc::now()),
        "cardiac arrest",
        Some(UnitsRequired::new(1, 0, 0)),
    );
    let dispatch = handle.process_emergency(emergency).await.unwrap();
    assert!(
        dispatch.units.is_empty(),
        "alerted vehicle must not be dispatched"
    );

    cancel.cancel();
}

#[tokio::test]
async fn test_dispatch_command_round_trip() {
    let (bus, handle, cancel) = start_stack().await;

    let agent = VehicleAgent::new(
        fast_agent_config("AMB-001", VehicleType::Ambulance),
        bus.clone() as Arc<dyn Transport>,
    );
    tokio::spawn(agent.run(cancel.clone()));

    wait_until(
        || {
            let handle = handle.clone();
            async move {
                let view = handle.fleet_view().await.unwrap();
                view.vehicles.iter().any(|v| v.is_available())
            }
        },
        "agent registration",
    )
    .await;

    // Watch the command topic and both broadcast topics
    let mut commands = bus
        .subscribe(&["aegis:fleet01:commands:AMB-001", "aegis:dispatch:*:assigned"])
        .await
        .unwrap();

    let emergency = Emergency::new(
        EmergencyType::Medical,
        EmergencySeverity::Critical,
        GeoLocation::new(19.43, -99.13, Utc::now()),
        "multi-vehicle collision",
        Some(UnitsRequired::new(1, 0, 0)),
    );
    let emergency_id = emergency.emergency_id.clone();
    let dispatch = handle.process_emergency(emergency).await.unwrap();
    assert_eq!(dispatch.vehicle_ids(), vec!["AMB-001"]);

    // Both the per-vehicle command and the assignment broadcast go out
    let mut saw_command = false;
    let mut saw_broadcast = false;
    for _ in 0..2 {
        let msg = tokio::time::timeout(Duration::from_secs(1), commands.recv())
            .await
            .expect("expected dispatch traffic on the bus")
            .unwrap();
        if msg.topic == "aegis:fleet01:commands:AMB-001" {
            let value: serde_json::Value = serde_json::from_str(&msg.payload).unwrap();
            assert_eq!(value["command"], "dispatch");
            assert_eq!(value["emergency_id"], emergency_id.as_str());
            assert_eq!(value["dispatch_id"], dispatch.dispatch_id.as_str());
            saw_command = true;
        } else {
            assert_eq!(msg.topic, topics::dispatch_assigned(&emergency_id));
            saw_broadcast = true;
        }
    }
    assert!(saw_command && saw_broadcast);

    // Resolution broadcast releases the vehicle
    let released = handle.resolve_emergency(&emergency_id).await.unwrap();
    assert_eq!(released, vec!["AMB-001"]);

    let view = handle.fleet_view().await.unwrap();
    let snap = view
        .vehicles
        .iter()
        .find(|v| v.vehicle_id == "AMB-001")
        .unwrap();
    assert_eq!(snap.operational_status, OperationalStatus::Idle);

    cancel.cancel();
}

#[tokio::test]
async fn test_heartbeats_refresh_liveness() {
    let (bus, handle, cancel) = start_stack().await;

    let agent = VehicleAgent::new(
        fast_agent_config("POL-001", VehicleType::Police),
        bus.clone() as Arc<dyn Transport>,
    );
    tokio::spawn(agent.run(cancel.clone()));

    // At 10 Hz a heartbeat lands after roughly one second
    let mut heartbeats = bus.subscribe(&[topics::HEARTBEAT_PATTERN]).await.unwrap();
    let msg = tokio::time::timeout(Duration::from_secs(5), heartbeats.recv())
        .await
        .expect("no heartbeat within 5s")
        .unwrap();
    assert_eq!(msg.topic, topics::heartbeat("fleet01", "POL-001"));

    let value: serde_json::Value = serde_json::from_str(&msg.payload).unwrap();
    assert_eq!(value["vehicle_id"], "POL-001");
    assert!(value["last_telemetry_sequence"].as_u64().unwrap() >= 10);

    // The vehicle is registered and live on the orchestrator side
    let view = handle.fleet_view().await.unwrap();
    assert!(view.vehicles.iter().any(|v| v.vehicle_id == "POL-001"));

    cancel.cancel();
}
