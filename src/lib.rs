//! AEGIS Fleet: Emergency Vehicle Coordination
//!
//! Distributed coordination backbone for a simulated emergency-response fleet.
//!
//! ## Architecture
//!
//! - **Vehicle Agents**: per-vehicle tick loops producing telemetry, injecting
//!   failure scenarios, and raising threshold-based predictive alerts
//! - **Orchestrator**: single owner task consolidating the live fleet state
//!   from the telemetry/heartbeat/alert streams
//! - **Dispatcher**: nearest-available-unit selection with bidirectional
//!   command flow back to the agents
//! - **Transport**: named-topic pub/sub contract with pattern subscriptions
//!   (in-memory broker included; any broker satisfying the contract works)

pub mod config;
pub mod types;
pub mod transport;
pub mod agent;
pub mod orchestrator;
pub mod api;

// Re-export configuration
pub use config::{AgentConfig, OrchestratorConfig};

// Re-export commonly used types
pub use types::{
    AlertSeverity, Dispatch, DispatchedUnit, Emergency, EmergencyStatus, EmergencyType,
    FailureCategory, GeoLocation, OperationalStatus, PredictiveAlert, UnitsRequired,
    VehicleStatusSnapshot, VehicleTelemetry, VehicleType, WheelPosition,
};

// Re-export the agent pipeline
pub use agent::{
    AnomalyDetector, FailureInjector, FailureScenario, TelemetryGenerator, VehicleAgent,
};

// Re-export orchestrator components
pub use orchestrator::{FleetEvent, Orchestrator, OrchestratorError, OrchestratorHandle};

// Re-export the transport contract
pub use transport::{InMemoryBus, Subscription, TopicMessage, Transport, TransportError};
