//! Shared data structures for the AEGIS fleet coordination pipeline
//!
//! This module defines the core types exchanged between vehicle agents and
//! the orchestrator:
//! - Vehicle identity, operational status, and GPS locations
//! - VehicleTelemetry (per-tick sensor snapshot)
//! - PredictiveAlert (threshold-based anomaly output)
//! - Emergency, UnitsRequired, Dispatch (incident lifecycle)
//! - VehicleStatusSnapshot (orchestrator's live per-vehicle record)
//! - Wire payloads for the pub/sub command channels

mod vehicle;
mod telemetry;
mod alerts;
mod emergency;
mod dispatch;
mod messages;
// Public because the anomaly detector and tests reference the raw
// threshold constants as `types::thresholds`.
pub mod thresholds;

pub use vehicle::*;
pub use telemetry::*;
pub use alerts::*;
pub use emergency::*;
pub use dispatch::*;
pub use messages::*;
