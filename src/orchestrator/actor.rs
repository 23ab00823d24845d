//! Orchestrator owner task
//!
//! All fleet, emergency, and dispatch state is owned by a single task that
//! consumes from one queue: ingress events arriving over the pub/sub
//! subscriptions and operator requests arriving as commands with oneshot
//! reply channels. Serializing every mutation through this queue is what
//! guarantees exclusive vehicle reservation for overlapping dispatches -
//! there are no locks to get wrong.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::ingress::{IngressError, IngressEvent};
use super::state::{FleetState, FleetSummary};
use crate::config::OrchestratorConfig;
use crate::transport::{topics, TopicMessage, Transport};
use crate::types::{
    AssignmentBroadcast, Dispatch, DispatchCommand, Emergency, EmergencyStatus,
    ResolutionBroadcast, VehicleStatusSnapshot,
};

/// Capacity of the real-time event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// Errors & Views
// ============================================================================

/// Caller-visible orchestrator failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("emergency not found: {0}")]
    NotFound(String),
    #[error("emergency already resolved: {0}")]
    Conflict(String),
    #[error("orchestrator is not running")]
    Unavailable,
}

/// An emergency together with its dispatch outcome
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyView {
    #[serde(flatten)]
    pub emergency: Emergency,
    pub dispatch_id: Option<String>,
    pub assigned_vehicles: Vec<String>,
}

/// Fleet summary plus per-vehicle snapshots
#[derive(Debug, Clone, Serialize)]
pub struct FleetView {
    pub summary: FleetSummary,
    pub vehicles: Vec<VehicleStatusSnapshot>,
}

/// Real-time event pushed to WebSocket clients
#[derive(Debug, Clone)]
pub enum FleetEvent {
    EmergencyDispatched(EmergencyView),
    EmergencyResolved {
        emergency: EmergencyView,
        released_vehicles: Vec<String>,
    },
}

// ============================================================================
// Commands & Handle
// ============================================================================

/// Requests consumed by the owner task
#[derive(Debug)]
enum OrchestratorCommand {
    ProcessEmergency {
        emergency: Emergency,
        respond_to: oneshot::Sender<Dispatch>,
    },
    ResolveEmergency {
        emergency_id: String,
        respond_to: oneshot::Sender<Result<Vec<String>, OrchestratorError>>,
    },
    GetFleet {
        respond_to: oneshot::Sender<FleetView>,
    },
    GetEmergencies {
        status: Option<EmergencyStatus>,
        respond_to: oneshot::Sender<Vec<EmergencyView>>,
    },
    GetEmergency {
        emergency_id: String,
        respond_to: oneshot::Sender<Option<EmergencyView>>,
    },
}

/// Cloneable handle for talking to the orchestrator task
#[derive(Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<OrchestratorCommand>,
    events: broadcast::Sender<FleetEvent>,
}

impl OrchestratorHandle {
    /// Route an emergency through the dispatcher and reserve units.
    ///
    /// Always yields a dispatch; it is empty when no units were available.
    pub async fn process_emergency(
        &self,
        emergency: Emergency,
    ) -> Result<Dispatch, OrchestratorError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(OrchestratorCommand::ProcessEmergency {
                emergency,
                respond_to,
            })
            .await
            .map_err(|_| OrchestratorError::Unavailable)?;
        response.await.map_err(|_| OrchestratorError::Unavailable)
    }

    /// Resolve an emergency and release its units.
    pub async fn resolve_emergency(
        &self,
        emergency_id: &str,
    ) -> Result<Vec<String>, OrchestratorError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(OrchestratorCommand::ResolveEmergency {
                emergency_id: emergency_id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| OrchestratorError::Unavailable)?;
        response.await.map_err(|_| OrchestratorError::Unavailable)?
    }

    pub async fn fleet_view(&self) -> Result<FleetView, OrchestratorError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(OrchestratorCommand::GetFleet { respond_to })
            .await
            .map_err(|_| OrchestratorError::Unavailable)?;
        response.await.map_err(|_| OrchestratorError::Unavailable)
    }

    /// All emergencies, optionally filtered by lifecycle status
    pub async fn emergencies(
        &self,
        status: Option<EmergencyStatus>,
    ) -> Result<Vec<EmergencyView>, OrchestratorError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(OrchestratorCommand::GetEmergencies { status, respond_to })
            .await
            .map_err(|_| OrchestratorError::Unavailable)?;
        response.await.map_err(|_| OrchestratorError::Unavailable)
    }

    pub async fn emergency(&self, emergency_id: &str) -> Result<EmergencyView, OrchestratorError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(OrchestratorCommand::GetEmergency {
                emergency_id: emergency_id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| OrchestratorError::Unavailable)?;
        response
            .await
            .map_err(|_| OrchestratorError::Unavailable)?
            .ok_or_else(|| OrchestratorError::NotFound(emergency_id.to_string()))
    }

    /// Subscribe to dispatch/resolution events (for the WebSocket fan-out)
    pub fn subscribe_events(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Central coordination task: fleet ingress plus emergency dispatch.
pub struct Orchestrator {
    config: OrchestratorConfig,
    transport: Arc<dyn Transport>,
    state: FleetState,
    rx: mpsc::Receiver<OrchestratorCommand>,
    events: broadcast::Sender<FleetEvent>,
}

impl Orchestrator {
    /// Create the orchestrator and its handle.
    pub fn new(
        config: OrchestratorConfig,
        transport: Arc<dyn Transport>,
    ) -> (Self, OrchestratorHandle) {
        let (tx, rx) = mpsc::channel(config.channel_buffer_size);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let handle = OrchestratorHandle {
            tx,
            events: events.clone(),
        };
        let orchestrator = Self {
            config,
            transport,
            state: FleetState::new(),
            rx,
            events,
        };
        (orchestrator, handle)
    }

    /// Run the owner task until cancelled.
    ///
    /// Subscribes to the vehicle stream patterns and the operator emergency
    /// topic; the subscription is released on every exit path.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), OrchestratorError> {
        let mut ingress = self
            .transport
            .subscribe(&[
                topics::TELEMETRY_PATTERN,
                topics::HEARTBEAT_PATTERN,
                topics::ALERTS_PATTERN,
                topics::EMERGENCIES_TOPIC,
            ])
            .await
            .map_err(|e| {
                error!(error = %e, "Orchestrator ingress subscription failed");
                OrchestratorError::Unavailable
            })?;

        info!(fleet_id = %self.config.fleet_id, "Orchestrator started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Orchestrator shutdown signal received");
                    break;
                }
                Some(command) = self.rx.recv() => {
                    self.handle_command(command).await;
                }
                message = ingress.recv() => {
                    match message {
                        Some(message) => self.handle_ingress(&message).await,
                        None => {
                            warn!("Transport closed, stopping orchestrator");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            vehicles = self.state.fleet.len(),
            emergencies = self.state.emergencies.len(),
            "Orchestrator stopped"
        );
        Ok(())
    }

    async fn handle_command(&mut self, command: OrchestratorCommand) {
        match command {
            OrchestratorCommand::ProcessEmergency {
                emergency,
                respond_to,
            } => {
                let dispatch = self.process_emergency(emergency).await;
                let _ = respond_to.send(dispatch);
            }
            OrchestratorCommand::ResolveEmergency {
                emergency_id,
                respond_to,
            } => {
                let result = self.resolve_emergency(&emergency_id).await;
                let _ = respond_to.send(result);
            }
            OrchestratorCommand::GetFleet { respond_to } => {
                let view = FleetView {
                    summary: self.state.summary(),
                    vehicles: self.state.snapshots(),
                };
                let _ = respond_to.send(view);
            }
            OrchestratorCommand::GetEmergencies { status, respond_to } => {
                let mut views: Vec<EmergencyView> = self
                    .state
                    .emergencies
                    .values()
                    .filter(|e| status.map_or(true, |s| e.status == s))
                    .filter_map(|e| self.emergency_view(&e.emergency_id))
                    .collect();
                views.sort_by_key(|v| v.emergency.created_at);
                let _ = respond_to.send(views);
            }
            OrchestratorCommand::GetEmergency {
                emergency_id,
                respond_to,
            } => {
                let _ = respond_to.send(self.emergency_view(&emergency_id));
            }
        }
    }

    /// Classify and apply one ingress message; bad messages are logged and
    /// dropped, never crashing the loop.
    async fn handle_ingress(&mut self, message: &TopicMessage) {
        let event = match IngressEvent::parse(message) {
            Ok(event) => event,
            Err(IngressError::UnknownTopic(topic)) => {
                debug!(topic = %topic, "Ignoring message on unrecognized topic");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed message");
                return;
            }
        };

        let now = Utc::now();
        match event {
            IngressEvent::Telemetry(telemetry) => {
                self.state.apply_telemetry(&telemetry, now);
            }
            IngressEvent::Heartbeat(ping) => {
                self.state.apply_heartbeat(&ping.vehicle_id, now);
            }
            IngressEvent::Alert(alert) => {
                info!(
                    vehicle_id = %alert.vehicle_id,
                    severity = %alert.severity,
                    component = %alert.component,
                    "Alert received"
                );
                self.state.apply_alert(&alert.vehicle_id);
            }
            IngressEvent::NewEmergency(emergency) => {
                info!(
                    emergency_id = %emergency.emergency_id,
                    emergency_type = %emergency.emergency_type,
                    "Emergency received from topic"
                );
                self.process_emergency(*emergency).await;
            }
        }
    }

    /// Store the emergency, reserve the nearest available units, and publish
    /// the per-vehicle commands plus the assignment broadcast.
    ///
    /// Publish failures are logged and do not roll back the reservation; the
    /// in-memory state is authoritative.
    async fn process_emergency(&mut self, emergency: Emergency) -> Dispatch {
        let now = Utc::now();
        let emergency_id = emergency.emergency_id.clone();
        self.state
            .emergencies
            .insert(emergency_id.clone(), emergency.clone());

        let dispatch = self.state.select_units(&emergency, now);
        self.state
            .dispatches
            .insert(emergency_id.clone(), dispatch.clone());

        if let Some(emergency) = self.state.emergencies.get_mut(&emergency_id) {
            if dispatch.units.is_empty() {
                emergency.status = EmergencyStatus::Dispatching;
                warn!(
                    emergency_id = %emergency_id,
                    emergency_type = %emergency.emergency_type,
                    "No units available, dispatch deferred"
                );
            } else {
                emergency.status = EmergencyStatus::Dispatched;
                emergency.dispatched_at = Some(now);
            }
        }

        self.publish_dispatch(&emergency_id, &dispatch).await;

        if let Some(view) = self.emergency_view(&emergency_id) {
            let _ = self.events.send(FleetEvent::EmergencyDispatched(view));
        }

        info!(
            emergency_id = %emergency_id,
            units_dispatched = dispatch.units.len(),
            vehicle_ids = ?dispatch.vehicle_ids(),
            "Emergency processed"
        );
        dispatch
    }

    async fn publish_dispatch(&self, emergency_id: &str, dispatch: &Dispatch) {
        let Some(emergency) = self.state.emergencies.get(emergency_id) else {
            return;
        };

        for unit in &dispatch.units {
            let command = DispatchCommand::new(
                emergency_id,
                emergency.emergency_type,
                emergency.location.clone(),
                dispatch.dispatch_id.clone(),
            );
            let topic = topics::commands(&self.config.fleet_id, &unit.vehicle_id);
            match serde_json::to_string(&command) {
                Ok(payload) => {
                    if let Err(e) = self.transport.publish(&topic, &payload).await {
                        error!(
                            vehicle_id = %unit.vehicle_id,
                            error = %e,
                            "Dispatch command publish failed"
                        );
                    }
                }
                Err(e) => error!(error = %e, "Dispatch command serialization failed"),
            }
        }

        let broadcast = AssignmentBroadcast {
            emergency_id: emergency_id.to_string(),
            dispatch_id: dispatch.dispatch_id.clone(),
            assigned_vehicles: dispatch.vehicle_ids(),
        };
        let topic = topics::dispatch_assigned(emergency_id);
        match serde_json::to_string(&broadcast) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(&topic, &payload).await {
                    error!(
                        emergency_id = %emergency_id,
                        error = %e,
                        "Assignment broadcast failed"
                    );
                }
            }
            Err(e) => error!(error = %e, "Assignment broadcast serialization failed"),
        }
    }

    /// Resolve an emergency: release its units, stamp timestamps, and
    /// broadcast the release (best effort).
    async fn resolve_emergency(
        &mut self,
        emergency_id: &str,
    ) -> Result<Vec<String>, OrchestratorError> {
        let now = Utc::now();
        let emergency = self
            .state
            .emergencies
            .get_mut(emergency_id)
            .ok_or_else(|| OrchestratorError::NotFound(emergency_id.to_string()))?;

        if emergency.status == EmergencyStatus::Resolved {
            return Err(OrchestratorError::Conflict(emergency_id.to_string()));
        }

        emergency.status = EmergencyStatus::Resolved;
        emergency.resolved_at = Some(now);

        let released = self.state.release_units(emergency_id);
        if let Some(dispatch) = self.state.dispatches.get_mut(emergency_id) {
            dispatch.completed_at = Some(now);
        }

        let broadcast = ResolutionBroadcast {
            emergency_id: emergency_id.to_string(),
            released_vehicles: released.clone(),
        };
        let topic = topics::dispatch_resolved(emergency_id);
        match serde_json::to_string(&broadcast) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(&topic, &payload).await {
                    error!(
                        emergency_id = %emergency_id,
                        error = %e,
                        "Resolution broadcast failed"
                    );
                }
            }
            Err(e) => error!(error = %e, "Resolution broadcast serialization failed"),
        }

        if let Some(view) = self.emergency_view(emergency_id) {
            let _ = self.events.send(FleetEvent::EmergencyResolved {
                emergency: view,
                released_vehicles: released.clone(),
            });
        }

        info!(
            emergency_id = %emergency_id,
            released_vehicles = ?released,
            "Emergency resolved"
        );
        Ok(released)
    }

    fn emergency_view(&self, emergency_id: &str) -> Option<EmergencyView> {
        let emergency = self.state.emergencies.get(emergency_id)?;
        let dispatch = self.state.dispatches.get(emergency_id);
        Some(EmergencyView {
            emergency: emergency.clone(),
            dispatch_id: dispatch.map(|d| d.dispatch_id.clone()),
            assigned_vehicles: dispatch.map(|d| d.vehicle_ids()).unwrap_or_default(),
        })
    }
}
