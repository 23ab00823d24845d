//! API request handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiState;
use crate::orchestrator::{EmergencyView, FleetView, OrchestratorError};
use crate::types::{
    Emergency, EmergencySeverity, EmergencyStatus, EmergencyType, GeoLocation, UnitsRequired,
};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Payload for `POST /emergencies`
#[derive(Debug, Deserialize)]
pub struct CreateEmergencyRequest {
    pub emergency_type: EmergencyType,
    #[serde(default = "default_severity")]
    pub severity: EmergencySeverity,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    pub description: String,
    /// Overrides the per-type defaults when present
    #[serde(default)]
    pub units_required: Option<UnitsRequired>,
    #[serde(default = "default_reporter")]
    pub reported_by: String,
}

fn default_severity() -> EmergencySeverity {
    EmergencySeverity::High
}

fn default_reporter() -> String {
    "operator".to_string()
}

/// Query parameters for `GET /emergencies`
#[derive(Debug, Default, Deserialize)]
pub struct ListEmergenciesParams {
    pub status: Option<EmergencyStatus>,
}

/// Response for `POST /emergencies/{id}/resolve`
#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub emergency: EmergencyView,
    pub released_vehicles: Vec<String>,
}

/// API failure mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(error: OrchestratorError) -> Self {
        let status = match error {
            OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
            OrchestratorError::Conflict(_) => StatusCode::CONFLICT,
            OrchestratorError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - liveness check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /fleet - fleet summary and per-vehicle snapshots
pub async fn get_fleet(State(state): State<ApiState>) -> Result<Json<FleetView>, ApiError> {
    Ok(Json(state.orchestrator.fleet_view().await?))
}

/// POST /emergencies - register a new emergency and dispatch nearest units
pub async fn create_emergency(
    State(state): State<ApiState>,
    Json(request): Json<CreateEmergencyRequest>,
) -> Result<(StatusCode, Json<EmergencyView>), ApiError> {
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ApiError::bad_request(format!(
            "latitude {} outside [-90, 90]",
            request.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ApiError::bad_request(format!(
            "longitude {} outside [-180, 180]",
            request.longitude
        )));
    }
    if request.description.trim().is_empty() {
        return Err(ApiError::bad_request("description must not be empty"));
    }
    if let Some(units) = &request.units_required {
        if units.total() == 0 {
            return Err(ApiError::bad_request(
                "units_required must request at least one unit",
            ));
        }
    }

    let location = GeoLocation::new(request.latitude, request.longitude, Utc::now());
    let mut emergency = Emergency::new(
        request.emergency_type,
        request.severity,
        location,
        request.description,
        request.units_required,
    );
    emergency.address = request.address;
    emergency.reported_by = request.reported_by;
    let emergency_id = emergency.emergency_id.clone();

    info!(
        emergency_id = %emergency_id,
        emergency_type = %emergency.emergency_type,
        "Emergency registered via API"
    );

    state.orchestrator.process_emergency(emergency).await?;
    let view = state.orchestrator.emergency(&emergency_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /emergencies - list emergencies, optionally filtered by status
pub async fn list_emergencies(
    State(state): State<ApiState>,
    Query(params): Query<ListEmergenciesParams>,
) -> Result<Json<Vec<EmergencyView>>, ApiError> {
    Ok(Json(state.orchestrator.emergencies(params.status).await?))
}

/// GET /emergencies/{id} - fetch one emergency with its dispatch
pub async fn get_emergency(
    State(state): State<ApiState>,
    Path(emergency_id): Path<String>,
) -> Result<Json<EmergencyView>, ApiError> {
    Ok(Json(state.orchestrator.emergency(&emergency_id).await?))
}

/// POST /emergencies/{id}/resolve - resolve and release assigned units
pub async fn resolve_emergency(
    State(state): State<ApiState>,
    Path(emergency_id): Path<String>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let released_vehicles = state.orchestrator.resolve_emergency(&emergency_id).await?;
    let emergency = state.orchestrator.emergency(&emergency_id).await?;
    Ok(Json(ResolveResponse {
        emergency,
        released_vehicles,
    }))
}
