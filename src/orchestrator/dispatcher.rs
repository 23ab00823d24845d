//! Nearest-available-unit selection
//!
//! Routes an emergency to the minimum-cost set of available units: filter per
//! vehicle type, sort by great-circle distance (ties broken by vehicle ID),
//! take the closest N, and reserve them by flipping their snapshots to
//! en_route. Runs inside the orchestrator's owner task, so two emergencies
//! can never reserve the same vehicle.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::state::FleetState;
use crate::types::{Dispatch, DispatchedUnit, Emergency, GeoLocation, OperationalStatus, VehicleType};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two GPS points in kilometers (Haversine).
///
/// Symmetric, and exactly zero for identical coordinates.
pub fn haversine_km(a: &GeoLocation, b: &GeoLocation) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

impl FleetState {
    /// Select and reserve the nearest available units for an emergency.
    ///
    /// Types with a zero requirement are skipped. When fewer units are
    /// available than required, the shortfall is logged and the dispatch
    /// proceeds with the partial selection. Every chosen vehicle transitions
    /// `idle -> en_route` with its `current_emergency_id` set before this
    /// method returns.
    pub fn select_units(&mut self, emergency: &Emergency, now: DateTime<Utc>) -> Dispatch {
        let mut selected: Vec<DispatchedUnit> = Vec::new();

        for vehicle_type in VehicleType::ALL {
            let required = emergency.units_required.of_type(vehicle_type) as usize;
            if required == 0 {
                continue;
            }

            let candidates = self.available_candidates(vehicle_type, &emergency.location);
            if candidates.len() < required {
                warn!(
                    emergency_id = %emergency.emergency_id,
                    vehicle_type = %vehicle_type,
                    required = required,
                    available = candidates.len(),
                    "insufficient_units"
                );
            }

            for (vehicle_id, distance_km) in candidates.into_iter().take(required) {
                if let Some(snap) = self.fleet.get_mut(&vehicle_id) {
                    snap.operational_status = OperationalStatus::EnRoute;
                    snap.current_emergency_id = Some(emergency.emergency_id.clone());
                }
                info!(
                    vehicle_id = %vehicle_id,
                    emergency_id = %emergency.emergency_id,
                    vehicle_type = %vehicle_type,
                    distance_km = distance_km,
                    "Unit assigned"
                );
                selected.push(DispatchedUnit::new(vehicle_id, vehicle_type, now));
            }
        }

        let dispatch = Dispatch::new(emergency.emergency_id.clone(), selected, now);
        info!(
            dispatch_id = %dispatch.dispatch_id,
            emergency_id = %emergency.emergency_id,
            units = dispatch.units.len(),
            "Dispatch created"
        );
        dispatch
    }

    /// Available vehicles of one type sorted by distance to the incident,
    /// nearest first, ties broken by vehicle ID.
    fn available_candidates(
        &self,
        vehicle_type: VehicleType,
        location: &GeoLocation,
    ) -> Vec<(String, f64)> {
        let mut candidates: Vec<(String, f64)> = self
            .fleet
            .values()
            .filter(|snap| snap.vehicle_type == vehicle_type && snap.is_available())
            .filter_map(|snap| {
                snap.location
                    .as_ref()
                    .map(|loc| (snap.vehicle_id.clone(), haversine_km(loc, location)))
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        candidates
    }

    /// Release every vehicle assigned to an emergency back to idle.
    ///
    /// Returns the released vehicle IDs in stable (sorted) order; resolving
    /// an emergency with no assigned vehicles yields an empty list.
    pub fn release_units(&mut self, emergency_id: &str) -> Vec<String> {
        let mut released: Vec<String> = Vec::new();

        for snap in self.fleet.values_mut() {
            if snap.current_emergency_id.as_deref() == Some(emergency_id) {
                snap.operational_status = OperationalStatus::Idle;
                snap.current_emergency_id = None;
                info!(
                    vehicle_id = %snap.vehicle_id,
                    emergency_id = %emergency_id,
                    "Unit released"
                );
                released.push(snap.vehicle_id.clone());
            }
        }

        released.sort();
        released
    }
}
