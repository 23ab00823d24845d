//! Orchestrator: fleet state consolidation and emergency dispatch
//!
//! ## Single-Owner Architecture
//!
//! ```text
//! telemetry/heartbeat/alert streams ─┐
//! aegis:emergencies:new topic ───────┤
//!                                    ├─> owner task (FleetState) ─> commands
//! REST/WS handle requests ───────────┘        │                     broadcasts
//!                                             └─> dispatch / resolve events
//! ```
//!
//! Every mutation of the fleet, emergency, and dispatch maps flows through
//! one queue consumed by one task, so ingress updates and overlapping
//! dispatch requests are serialized without locks.

mod actor;
mod dispatcher;
mod ingress;
mod state;

pub use actor::{
    EmergencyView, FleetEvent, FleetView, Orchestrator, OrchestratorError, OrchestratorHandle,
};
pub use dispatcher::haversine_km;
pub use ingress::{IngressError, IngressEvent};
pub use state::{FleetState, FleetSummary, TypeBreakdown};
