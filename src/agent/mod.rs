//! Vehicle Agent
//!
//! ## Per-Tick Pipeline
//!
//! ```text
//! 1. Generate baseline telemetry (baseline + Gaussian noise)
//! 2. Apply active failure scenarios (deterministic progression)
//! 3. Run threshold-based anomaly detection
//! 4. Publish telemetry, then each alert
//! 5. Every 10th tick, publish a heartbeat
//! ```
//!
//! The agent also listens on its own command topic and the dispatch
//! resolution broadcasts, reacting to `dispatch` orders (go en_route) and
//! releases (return to idle). Publish failures are logged and swallowed;
//! the next tick reissues state.

mod telemetry;
mod failure;
mod anomaly;

pub use anomaly::AnomalyDetector;
pub use failure::{FailureInjector, FailureScenario};
pub use telemetry::TelemetryGenerator;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{AgentConfig, HEARTBEAT_EVERY_TICKS};
use crate::transport::{topics, TopicMessage, Transport};
use crate::types::{
    CommandProbe, DispatchCommand, HeartbeatPing, OperationalStatus, ResolutionBroadcast,
};

/// Diagnostic snapshot of one agent's local state
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub vehicle_id: String,
    pub operational_status: OperationalStatus,
    pub current_emergency_id: Option<String>,
    pub ticks: u64,
    pub last_telemetry_sequence: u64,
}

/// One simulated emergency vehicle.
///
/// Owns the telemetry generator, failure injector, and anomaly detector, and
/// runs the tick loop plus the command listener as a single cooperative task.
pub struct VehicleAgent {
    config: AgentConfig,
    transport: Arc<dyn Transport>,
    generator: TelemetryGenerator,
    injector: FailureInjector,
    detector: AnomalyDetector,
    operational_status: OperationalStatus,
    current_emergency_id: Option<String>,
    tick_count: u64,
    started_at: Option<DateTime<Utc>>,
}

impl VehicleAgent {
    pub fn new(config: AgentConfig, transport: Arc<dyn Transport>) -> Self {
        let generator = TelemetryGenerator::new(&config);
        let detector = AnomalyDetector::new(config.vehicle_id.clone());
        info!(
            vehicle_id = %config.vehicle_id,
            vehicle_type = %config.vehicle_type,
            fleet_id = %config.fleet_id,
            "Vehicle agent initialized"
        );
        Self {
            config,
            transport,
            generator,
            injector: FailureInjector::new(),
            detector,
            operational_status: OperationalStatus::Idle,
            current_emergency_id: None,
            tick_count: 0,
            started_at: None,
        }
    }

    /// Activate a failure scenario starting now (used by demo drivers and tests)
    pub fn activate_failure(&mut self, scenario: FailureScenario) {
        self.injector.activate(scenario, Utc::now());
    }

    pub fn deactivate_failure(&mut self, scenario: FailureScenario) {
        self.injector.deactivate(scenario);
    }

    pub fn status(&self) -> AgentStatus {
        AgentStatus {
            vehicle_id: self.config.vehicle_id.clone(),
            operational_status: self.operational_status,
            current_emergency_id: self.current_emergency_id.clone(),
            ticks: self.tick_count,
            last_telemetry_sequence: self.generator.sequence_number(),
        }
    }

    /// Run the agent until cancelled.
    ///
    /// Ticks at the configured frequency with a rate-compensating interval,
    /// while servicing dispatch commands between ticks. The command
    /// subscription is released on every exit path.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        self.config
            .validate()
            .with_context(|| format!("invalid agent config for {}", self.config.vehicle_id))?;

        let command_topic = topics::commands(&self.config.fleet_id, &self.config.vehicle_id);
        let mut commands = self
            .transport
            .subscribe(&[&command_topic, topics::RESOLVED_PATTERN])
            .await
            .context("command subscription failed")?;

        let mut ticker =
            tokio::time::interval(Duration::from_secs_f64(self.config.tick_interval_secs()));

        self.started_at = Some(Utc::now());
        info!(
            vehicle_id = %self.config.vehicle_id,
            frequency_hz = self.config.telemetry_frequency_hz,
            "Vehicle agent running"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(vehicle_id = %self.config.vehicle_id, "Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
                msg = commands.recv() => {
                    match msg {
                        Some(message) => self.handle_message(&message),
                        None => {
                            warn!(vehicle_id = %self.config.vehicle_id, "Transport closed, stopping agent");
                            break;
                        }
                    }
                }
            }
        }

        info!(
            vehicle_id = %self.config.vehicle_id,
            ticks = self.tick_count,
            "Vehicle agent stopped"
        );
        Ok(())
    }

    /// Execute one tick of the telemetry pipeline.
    ///
    /// Never fails: every error inside a tick is logged and the loop
    /// continues.
    pub async fn tick(&mut self) {
        let now = Utc::now();
        self.tick_count += 1;

        let mut telemetry = self.generator.generate(now);
        self.injector.apply(&mut telemetry, now);

        let alerts = self.detector.analyze(&telemetry);

        let telemetry_topic = topics::telemetry(&self.config.fleet_id, &self.config.vehicle_id);
        match serde_json::to_string(&telemetry) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(&telemetry_topic, &payload).await {
                    warn!(
                        vehicle_id = %self.config.vehicle_id,
                        error = %e,
                        "Telemetry publish failed"
                    );
                }
            }
            Err(e) => warn!(
                vehicle_id = %self.config.vehicle_id,
                error = %e,
                "Telemetry serialization failed"
            ),
        }

        let alerts_topic = topics::alerts(&self.config.fleet_id, &self.config.vehicle_id);
        for alert in &alerts {
            warn!(
                vehicle_id = %self.config.vehicle_id,
                alert_id = %alert.alert_id,
                severity = %alert.severity,
                component = %alert.component,
                "Alert generated"
            );
            match serde_json::to_string(alert) {
                Ok(payload) => {
                    if let Err(e) = self.transport.publish(&alerts_topic, &payload).await {
                        warn!(
                            vehicle_id = %self.config.vehicle_id,
                            alert_id = %alert.alert_id,
                            error = %e,
                            "Alert publish failed"
                        );
                    }
                }
                Err(e) => warn!(
                    vehicle_id = %self.config.vehicle_id,
                    error = %e,
                    "Alert serialization failed"
                ),
            }
        }

        if self.tick_count % HEARTBEAT_EVERY_TICKS == 0 {
            self.publish_heartbeat(now).await;
        }
    }

    async fn publish_heartbeat(&self, now: DateTime<Utc>) {
        let uptime_seconds = self
            .started_at
            .map(|start| now.signed_duration_since(start).num_seconds().max(0) as u64)
            .unwrap_or(0);

        let ping = HeartbeatPing {
            vehicle_id: self.config.vehicle_id.clone(),
            timestamp: now,
            uptime_seconds,
            last_telemetry_sequence: self.generator.sequence_number(),
        };

        let topic = topics::heartbeat(&self.config.fleet_id, &self.config.vehicle_id);
        match serde_json::to_string(&ping) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(&topic, &payload).await {
                    warn!(
                        vehicle_id = %self.config.vehicle_id,
                        error = %e,
                        "Heartbeat publish failed"
                    );
                }
            }
            Err(e) => warn!(
                vehicle_id = %self.config.vehicle_id,
                error = %e,
                "Heartbeat serialization failed"
            ),
        }
    }

    /// React to a message from the command topic or a resolution broadcast.
    ///
    /// Unknown command keys are ignored; malformed JSON is logged and dropped.
    fn handle_message(&mut self, message: &TopicMessage) {
        if topics::matches(topics::RESOLVED_PATTERN, &message.topic) {
            match serde_json::from_str::<ResolutionBroadcast>(&message.payload) {
                Ok(broadcast) => self.handle_resolution(&broadcast),
                Err(e) => warn!(
                    vehicle_id = %self.config.vehicle_id,
                    channel = %message.topic,
                    error = %e,
                    "Malformed resolution broadcast dropped"
                ),
            }
            return;
        }

        let probe: CommandProbe = match serde_json::from_str(&message.payload) {
            Ok(probe) => probe,
            Err(e) => {
                warn!(
                    vehicle_id = %self.config.vehicle_id,
                    channel = %message.topic,
                    error = %e,
                    "Malformed command dropped"
                );
                return;
            }
        };

        if probe.command != DispatchCommand::COMMAND {
            debug!(
                vehicle_id = %self.config.vehicle_id,
                command = %probe.command,
                "Ignoring unknown command"
            );
            return;
        }

        match serde_json::from_str::<DispatchCommand>(&message.payload) {
            Ok(command) => {
                info!(
                    vehicle_id = %self.config.vehicle_id,
                    emergency_id = %command.emergency_id,
                    emergency_type = %command.emergency_type,
                    "Dispatch command received, going en route"
                );
                self.operational_status = OperationalStatus::EnRoute;
                self.current_emergency_id = Some(command.emergency_id);
            }
            Err(e) => warn!(
                vehicle_id = %self.config.vehicle_id,
                channel = %message.topic,
                error = %e,
                "Malformed dispatch command dropped"
            ),
        }
    }

    fn handle_resolution(&mut self, broadcast: &ResolutionBroadcast) {
        if !broadcast
            .released_vehicles
            .iter()
            .any(|vid| vid == &self.config.vehicle_id)
        {
            return;
        }
        info!(
            vehicle_id = %self.config.vehicle_id,
            emergency_id = %broadcast.emergency_id,
            "Released from emergency, returning to idle"
        );
        self.operational_status = OperationalStatus::Idle;
        self.current_emergency_id = None;
    }
}
