//! Consolidated fleet state
//!
//! One live [`VehicleStatusSnapshot`] per vehicle plus the emergency and
//! dispatch records, owned exclusively by the orchestrator task. The ingress
//! appliers here implement the vehicle-stream state machine: auto-registration
//! on first telemetry, best-effort location updates, heartbeat liveness, and
//! sticky alert flags.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::types::{
    infer_vehicle_type, Dispatch, Emergency, VehicleStatusSnapshot, VehicleTelemetry, VehicleType,
};

/// Per-type vehicle counts for the fleet summary
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TypeBreakdown {
    pub total: usize,
    pub available: usize,
}

/// Aggregate view of the fleet
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub total_vehicles: usize,
    pub available_vehicles: usize,
    pub active_emergencies: usize,
    pub by_type: BTreeMap<VehicleType, TypeBreakdown>,
}

/// In-memory fleet, emergency, and dispatch maps.
///
/// Mutated only from the orchestrator's owner task; snapshots are created
/// lazily and never destroyed.
#[derive(Debug, Default)]
pub struct FleetState {
    pub(crate) fleet: HashMap<String, VehicleStatusSnapshot>,
    pub(crate) emergencies: HashMap<String, Emergency>,
    pub(crate) dispatches: HashMap<String, Dispatch>,
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a telemetry record: register unknown vehicles, refresh liveness,
    /// and update location and health metrics.
    ///
    /// A location outside its physical ranges leaves the prior value in place.
    pub fn apply_telemetry(&mut self, telemetry: &VehicleTelemetry, now: DateTime<Utc>) {
        let snap = self
            .fleet
            .entry(telemetry.vehicle_id.clone())
            .or_insert_with(|| {
                let vehicle_type = infer_vehicle_type(&telemetry.vehicle_id);
                info!(
                    vehicle_id = %telemetry.vehicle_id,
                    vehicle_type = %vehicle_type,
                    "New vehicle registered"
                );
                VehicleStatusSnapshot::register(telemetry.vehicle_id.clone(), vehicle_type, now)
            });

        snap.last_seen_at = now;
        if telemetry.location.is_valid() {
            snap.location = Some(telemetry.location.clone());
        } else {
            debug!(
                vehicle_id = %telemetry.vehicle_id,
                "Out-of-range location ignored, keeping previous fix"
            );
        }
        snap.battery_voltage = Some(telemetry.battery_voltage);
        snap.fuel_level_percent = Some(telemetry.fuel_level_percent);
    }

    /// Refresh liveness for a known vehicle; heartbeats from unknown vehicles
    /// are ignored.
    pub fn apply_heartbeat(&mut self, vehicle_id: &str, now: DateTime<Utc>) {
        if let Some(snap) = self.fleet.get_mut(vehicle_id) {
            snap.last_seen_at = now;
            debug!(vehicle_id = %vehicle_id, "Heartbeat received");
        }
    }

    /// Mark a known vehicle as carrying an active alert (sticky until an
    /// explicit acknowledgment, which lives outside this core).
    pub fn apply_alert(&mut self, vehicle_id: &str) {
        if let Some(snap) = self.fleet.get_mut(vehicle_id) {
            snap.has_active_alert = true;
            info!(vehicle_id = %vehicle_id, "Active alert flagged on vehicle");
        }
    }

    pub fn snapshot(&self, vehicle_id: &str) -> Option<&VehicleStatusSnapshot> {
        self.fleet.get(vehicle_id)
    }

    /// All snapshots ordered by vehicle ID for stable output
    pub fn snapshots(&self) -> Vec<VehicleStatusSnapshot> {
        let mut vehicles: Vec<VehicleStatusSnapshot> = self.fleet.values().cloned().collect();
        vehicles.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        vehicles
    }

    /// Aggregate totals, availability, and per-type breakdown
    pub fn summary(&self) -> FleetSummary {
        let mut by_type: BTreeMap<VehicleType, TypeBreakdown> = BTreeMap::new();
        let mut available_vehicles = 0;

        for snap in self.fleet.values() {
            let entry = by_type.entry(snap.vehicle_type).or_default();
            entry.total += 1;
            if snap.is_available() {
                entry.available += 1;
                available_vehicles += 1;
            }
        }

        FleetSummary {
            total_vehicles: self.fleet.len(),
            available_vehicles,
            active_emergencies: self.emergencies.values().filter(|e| e.is_active()).count(),
            by_type,
        }
    }
}
