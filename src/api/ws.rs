//! WebSocket event stream
//!
//! Pushes `{event, data, ts}` JSON frames to every connected client for
//! `emergency.dispatched` and `emergency.resolved` events. Clients that lag
//! behind the broadcast buffer skip missed events rather than stalling the
//! orchestrator.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::ApiState;
use crate::orchestrator::FleetEvent;

/// Frame pushed to WebSocket clients
#[derive(Debug, Serialize)]
struct WsFrame {
    event: &'static str,
    data: serde_json::Value,
    ts: chrono::DateTime<Utc>,
}

impl WsFrame {
    fn from_event(event: &FleetEvent) -> Option<String> {
        let (name, data) = match event {
            FleetEvent::EmergencyDispatched(view) => {
                ("emergency.dispatched", serde_json::to_value(view).ok()?)
            }
            FleetEvent::EmergencyResolved {
                emergency,
                released_vehicles,
            } => {
                let mut data = serde_json::to_value(emergency).ok()?;
                data["released_vehicles"] = serde_json::to_value(released_vehicles).ok()?;
                ("emergency.resolved", data)
            }
        };
        serde_json::to_string(&WsFrame {
            event: name,
            data,
            ts: Utc::now(),
        })
        .ok()
    }
}

/// GET /ws - upgrade to the real-time event stream
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    let events = state.orchestrator.subscribe_events();
    ws.on_upgrade(move |socket| stream_events(socket, events))
}

async fn stream_events(mut socket: WebSocket, mut events: broadcast::Receiver<FleetEvent>) {
    info!("WebSocket client connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let Some(frame) = WsFrame::from_event(&event) else {
                            continue;
                        };
                        if socket.send(Message::Text(frame)).await.is_err() {
                            debug!("WebSocket send failed, closing");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed = missed, "WebSocket client lagged, skipping events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Event channel closed, ending WebSocket stream");
                        break;
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Client messages are keep-alives; drop everything but close
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}
