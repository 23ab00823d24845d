//! API route definitions

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{handlers, ws, ApiState};

/// Build the full API router with CORS and request tracing
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/fleet", get(handlers::get_fleet))
        .route("/emergencies", post(handlers::create_emergency))
        .route("/emergencies", get(handlers::list_emergencies))
        .route("/emergencies/:id", get(handlers::get_emergency))
        .route("/emergencies/:id/resolve", post(handlers::resolve_emergency))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
