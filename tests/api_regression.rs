//! API Regression Tests
//!
//! Drive the REST façade against a live orchestrator task and a seeded fleet
//! on the in-memory bus: the create/inspect/resolve emergency lifecycle, the
//! status filter, the fleet view, and the 404/409 error contract.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use aegis_fleet::agent::TelemetryGenerator;
use aegis_fleet::api::{create_app, ApiState};
use aegis_fleet::config::{AgentConfig, OrchestratorConfig};
use aegis_fleet::orchestrator::{Orchestrator, OrchestratorHandle};
use aegis_fleet::transport::{topics, InMemoryBus, Transport};
use aegis_fleet::types::infer_vehicle_type;

async fn start_api() -> (Router, Arc<InMemoryBus>, OrchestratorHandle, CancellationToken) {
    let bus = Arc::new(InMemoryBus::new());
    let (orchestrator, handle) = Orchestrator::new(OrchestratorConfig::default(), bus.clone());
    let cancel = CancellationToken::new();
    tokio::spawn(orchestrator.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let app = create_app(ApiState {
        orchestrator: handle.clone(),
    });
    (app, bus, handle, cancel)
}

async fn seed_vehicle(bus: &InMemoryBus, vehicle_id: &str, lat: f64, lon: f64) {
    let config = AgentConfig::new(vehicle_id, infer_vehicle_type(vehicle_id))
        .with_position(lat, lon)
        .with_seed(13);
    let telemetry = TelemetryGenerator::new(&config).generate(Utc::now());
    bus.publish(
        &topics::telemetry("fleet01", vehicle_id),
        &serde_json::to_string(&telemetry).unwrap(),
    )
    .await
    .unwrap();
}

async fn wait_for_fleet_size(handle: &OrchestratorHandle, count: usize) {
    for _ in 0..100 {
        if handle.fleet_view().await.unwrap().summary.total_vehicles >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("fleet never reached {} vehicles", count);
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_emergency_lifecycle_over_http() {
    let (app, bus, handle, cancel) = start_api().await;
    seed_vehicle(&bus, "AMB-001", 19.44, -99.14).await;
    seed_vehicle(&bus, "AMB-002", 19.50, -99.20).await;
    wait_for_fleet_size(&handle, 2).await;

    // Create: nearest ambulance is assigned
    let request_body = serde_json::json!({
        "emergency_type": "medical",
        "severity": 4,
        "latitude": 19.43,
        "longitude": -99.13,
        "description": "Cardiac arrest, unconscious adult",
        "units_required": {"ambulances": 1}
    });
    let response = app
        .clone()
        .oneshot(post_json("/emergencies", &request_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["status"], "dispatched");
    assert_eq!(created["severity"], 4);
    assert_eq!(created["assigned_vehicles"], serde_json::json!(["AMB-001"]));
    assert!(created["dispatch_id"].is_string());
    let emergency_id = created["emergency_id"].as_str().unwrap().to_string();

    // Fetch it back
    let response = app
        .clone()
        .oneshot(get(&format!("/emergencies/{}", emergency_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The status filter sees it as dispatched, not as pending
    let response = app
        .clone()
        .oneshot(get("/emergencies?status=dispatched"))
        .await
        .unwrap();
    let listed = json_body(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get("/emergencies?status=pending"))
        .await
        .unwrap();
    assert!(json_body(response).await.as_array().unwrap().is_empty());

    // Fleet shows one en_route, one idle
    let response = app.clone().oneshot(get("/fleet")).await.unwrap();
    let fleet = json_body(response).await;
    assert_eq!(fleet["summary"]["total_vehicles"], 2);
    assert_eq!(fleet["summary"]["available_vehicles"], 1);
    assert_eq!(fleet["summary"]["active_emergencies"], 1);

    // Resolve: the ambulance is released
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/emergencies/{}/resolve", emergency_id),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = json_body(response).await;
    assert_eq!(resolved["status"], "resolved");
    assert_eq!(
        resolved["released_vehicles"],
        serde_json::json!(["AMB-001"])
    );

    // Resolving again conflicts
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/emergencies/{}/resolve", emergency_id),
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    cancel.cancel();
}

#[tokio::test]
async fn test_default_units_applied_per_emergency_type() {
    let (app, bus, handle, cancel) = start_api().await;
    seed_vehicle(&bus, "AMB-001", 19.44, -99.14).await;
    seed_vehicle(&bus, "FIRE-001", 19.44, -99.14).await;
    seed_vehicle(&bus, "FIRE-002", 19.45, -99.15).await;
    wait_for_fleet_size(&handle, 3).await;

    // A fire defaults to 1 ambulance + 2 fire trucks
    let request_body = serde_json::json!({
        "emergency_type": "fire",
        "latitude": 19.43,
        "longitude": -99.13,
        "description": "Apartment fire, third floor"
    });
    let response = app
        .clone()
        .oneshot(post_json("/emergencies", &request_body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let assigned = created["assigned_vehicles"].as_array().unwrap();
    assert_eq!(assigned.len(), 3);
    assert_eq!(created["units_required"]["ambulances"], 1);
    assert_eq!(created["units_required"]["fire_trucks"], 2);

    cancel.cancel();
}

#[tokio::test]
async fn test_resolve_unknown_emergency_is_404() {
    let (app, _bus, _handle, cancel) = start_api().await;
    let response = app
        .oneshot(post_json(
            "/emergencies/does-not-exist/resolve",
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    cancel.cancel();
}

#[tokio::test]
async fn test_validation_rejections() {
    let (app, _bus, _handle, cancel) = start_api().await;

    // Longitude out of range
    let response = app
        .clone()
        .oneshot(post_json(
            "/emergencies",
            &serde_json::json!({
                "emergency_type": "medical",
                "latitude": 19.43,
                "longitude": -181.0,
                "description": "x"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Severity outside 1-5 fails enum decoding
    let response = app
        .clone()
        .oneshot(post_json(
            "/emergencies",
            &serde_json::json!({
                "emergency_type": "medical",
                "severity": 9,
                "latitude": 19.43,
                "longitude": -99.13,
                "description": "x"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Explicit zero units
    let response = app
        .clone()
        .oneshot(post_json(
            "/emergencies",
            &serde_json::json!({
                "emergency_type": "medical",
                "latitude": 19.43,
                "longitude": -99.13,
                "description": "x",
                "units_required": {"ambulances": 0, "fire_trucks": 0, "police": 0}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    cancel.cancel();
}

#[tokio::test]
async fn test_health_and_empty_fleet() {
    let (app, _bus, _handle, cancel) = start_api().await;

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = app.clone().oneshot(get("/fleet")).await.unwrap();
    let fleet = json_body(response).await;
    assert_eq!(fleet["summary"]["total_vehicles"], 0);
    assert!(fleet["vehicles"].as_array().unwrap().is_empty());

    cancel.cancel();
}
