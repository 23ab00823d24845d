//! REST + WebSocket façade over the orchestrator
//!
//! Thin translation layer: HTTP requests become orchestrator handle calls,
//! orchestrator events become WebSocket frames. Input validation happens
//! here so out-of-range values never reach the coordination core.
//!
//! - `POST /emergencies` - register and dispatch
//! - `GET  /emergencies[?status=...]` - list
//! - `GET  /emergencies/{id}` - fetch one (404 if absent)
//! - `POST /emergencies/{id}/resolve` - resolve (404 absent, 409 resolved)
//! - `GET  /fleet` - summary + per-vehicle snapshots
//! - `GET  /health` - liveness
//! - `WS   /ws` - `{event, data, ts}` frames for dispatch/resolution events

mod handlers;
mod routes;
mod ws;

pub use handlers::{ApiError, CreateEmergencyRequest, ResolveResponse};
pub use routes::create_app;

use crate::orchestrator::OrchestratorHandle;

/// Shared state injected into every handler
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: OrchestratorHandle,
}
