//! Synthetic telemetry generation
//!
//! Produces realistic-looking sensor readings by adding Gaussian noise to
//! per-metric baselines for a vehicle parked at its station. Each reading is
//! `baseline + Normal(0, sigma)` with `sigma = |baseline * noise / 2|`;
//! percentage metrics are clamped to [0, 100].

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::config::AgentConfig;
use crate::types::{GeoLocation, VehicleTelemetry, VibrationG, WheelPosition};

// ============================================================================
// Baselines
// ============================================================================

/// Engine temperature at operating idle (Celsius)
const BASE_ENGINE_TEMP: f64 = 90.0;
/// Coolant temperature (Celsius)
const BASE_COOLANT_TEMP: f64 = 85.0;
/// Idle engine speed (RPM)
const BASE_ENGINE_RPM: f64 = 800.0;
/// Healthy battery terminal voltage (V)
const BASE_BATTERY_VOLTAGE: f64 = 13.8;
/// Healthy alternator output (V)
const BASE_ALTERNATOR_VOLTAGE: f64 = 14.2;
/// Battery state of charge (%)
const BASE_BATTERY_SOC: f64 = 95.0;
/// Fuel level (%)
const BASE_FUEL_LEVEL: f64 = 75.0;
/// Cold tire pressure (psi)
const BASE_TIRE_PRESSURE: f64 = 80.0;
/// Front brake pad thickness (mm)
const BASE_BRAKE_PAD_FRONT: f64 = 8.0;
/// Rear brake pad thickness (mm)
const BASE_BRAKE_PAD_REAR: f64 = 9.0;
/// Brake system temperature (Celsius)
const BASE_BRAKE_TEMP: f64 = 40.0;
/// Chassis vibration at rest (g)
const BASE_VIBRATION: f64 = 0.05;
/// Odometer (km)
const BASE_ODOMETER: f64 = 45_678.9;

/// Standard noise fraction for most metrics (~±2%)
const NOISE_STANDARD: f64 = 0.02;
/// Tighter noise for slow-moving metrics (~±1%)
const NOISE_TIGHT: f64 = 0.01;

// ============================================================================
// Generator
// ============================================================================

/// Baseline-plus-noise telemetry generator for one vehicle.
///
/// Owns the per-agent monotonic sequence counter.
pub struct TelemetryGenerator {
    vehicle_id: String,
    initial_latitude: f64,
    initial_longitude: f64,
    initial_altitude: f64,
    rng: StdRng,
    sequence_number: u64,
}

impl TelemetryGenerator {
    pub fn new(config: &AgentConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            vehicle_id: config.vehicle_id.clone(),
            initial_latitude: config.initial_latitude,
            initial_longitude: config.initial_longitude,
            initial_altitude: config.initial_altitude,
            rng,
            sequence_number: 0,
        }
    }

    /// Sequence number of the most recently generated record
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Generate one telemetry record stamped with `now`.
    ///
    /// The sequence number is strictly increasing across calls.
    pub fn generate(&mut self, now: DateTime<Utc>) -> VehicleTelemetry {
        self.sequence_number += 1;

        let mut location = GeoLocation::new(self.initial_latitude, self.initial_longitude, now);
        location.altitude = self.initial_altitude;

        VehicleTelemetry {
            vehicle_id: self.vehicle_id.clone(),
            sequence_number: self.sequence_number,
            timestamp: now,
            location,
            // Parked at station: odometer does not move
            odometer_km: BASE_ODOMETER,
            engine_temp_celsius: self.noisy(BASE_ENGINE_TEMP, NOISE_STANDARD),
            coolant_temp_celsius: self.noisy(BASE_COOLANT_TEMP, NOISE_STANDARD),
            engine_rpm: self.noisy(BASE_ENGINE_RPM, NOISE_STANDARD).max(0.0),
            battery_voltage: self.noisy(BASE_BATTERY_VOLTAGE, NOISE_STANDARD),
            alternator_voltage: self.noisy(BASE_ALTERNATOR_VOLTAGE, NOISE_TIGHT),
            battery_soc_percent: self.noisy_percent(BASE_BATTERY_SOC, NOISE_TIGHT),
            fuel_level_percent: self.noisy_percent(BASE_FUEL_LEVEL, NOISE_TIGHT),
            tire_pressure_psi: WheelPosition::ALL
                .iter()
                .map(|w| (*w, self.noisy(BASE_TIRE_PRESSURE, NOISE_TIGHT)))
                .collect(),
            brake_pad_thickness_mm: WheelPosition::ALL
                .iter()
                .map(|w| {
                    let base = if w.is_front() {
                        BASE_BRAKE_PAD_FRONT
                    } else {
                        BASE_BRAKE_PAD_REAR
                    };
                    (*w, self.noisy(base, NOISE_TIGHT))
                })
                .collect(),
            brake_temp_celsius: self.noisy(BASE_BRAKE_TEMP, NOISE_STANDARD),
            vibration_g: VibrationG {
                x: self.noisy(BASE_VIBRATION, NOISE_STANDARD).abs(),
                y: self.noisy(BASE_VIBRATION, NOISE_STANDARD).abs(),
                z: self.noisy(BASE_VIBRATION, NOISE_STANDARD).abs(),
            },
        }
    }

    /// `baseline + Gaussian(0, |baseline * noise / 2|)`
    fn noisy(&mut self, baseline: f64, noise_fraction: f64) -> f64 {
        let sigma = (baseline * noise_fraction / 2.0).abs();
        if sigma <= 0.0 {
            return baseline;
        }
        let Ok(dist) = Normal::new(0.0, sigma) else {
            return baseline;
        };
        baseline + dist.sample(&mut self.rng)
    }

    /// Noisy percentage, clamped to [0, 100]
    fn noisy_percent(&mut self, baseline: f64, noise_fraction: f64) -> f64 {
        self.noisy(baseline, noise_fraction).clamp(0.0, 100.0)
    }
}
