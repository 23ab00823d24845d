//! Configuration for vehicle agents and the orchestrator
//!
//! Typed configuration with environment overrides. All variables use the
//! `AEGIS_` prefix (e.g. `AEGIS_FLEET_ID`, `AEGIS_SERVER_ADDR`).

use thiserror::Error;

use crate::types::VehicleType;

/// Lowest supported telemetry frequency (Hz)
pub const MIN_TELEMETRY_HZ: f64 = 0.1;
/// Highest supported telemetry frequency (Hz)
pub const MAX_TELEMETRY_HZ: f64 = 10.0;
/// A heartbeat is published every Nth tick
pub const HEARTBEAT_EVERY_TICKS: u64 = 10;

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("vehicle_id must not be empty")]
    EmptyVehicleId,
    #[error("telemetry frequency {0} Hz outside supported range [{MIN_TELEMETRY_HZ}, {MAX_TELEMETRY_HZ}]")]
    FrequencyOutOfRange(f64),
    #[error("initial coordinates ({0}, {1}) outside valid latitude/longitude ranges")]
    CoordinatesOutOfRange(f64, f64),
}

/// Configuration for a single vehicle agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Unique vehicle identifier, e.g. `AMB-001`
    pub vehicle_id: String,
    pub vehicle_type: VehicleType,
    /// Fleet identifier used in topic names
    pub fleet_id: String,
    /// Telemetry generation frequency in Hz, [0.1, 10.0]
    pub telemetry_frequency_hz: f64,
    /// Starting latitude (vehicle is parked at station)
    pub initial_latitude: f64,
    /// Starting longitude
    pub initial_longitude: f64,
    /// Starting altitude in meters
    pub initial_altitude: f64,
    /// Seed for the telemetry noise generator; `None` seeds from entropy
    pub rng_seed: Option<u64>,
}

impl AgentConfig {
    /// Agent configuration with the standard defaults (San Francisco station,
    /// 1 Hz telemetry).
    pub fn new(vehicle_id: impl Into<String>, vehicle_type: VehicleType) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            vehicle_type,
            fleet_id: "fleet01".to_string(),
            telemetry_frequency_hz: 1.0,
            initial_latitude: 37.7749,
            initial_longitude: -122.4194,
            initial_altitude: 0.0,
            rng_seed: None,
        }
    }

    pub fn with_fleet_id(mut self, fleet_id: impl Into<String>) -> Self {
        self.fleet_id = fleet_id.into();
        self
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.initial_latitude = latitude;
        self.initial_longitude = longitude;
        self
    }

    pub fn with_frequency(mut self, hz: f64) -> Self {
        self.telemetry_frequency_hz = hz;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Reject configurations the agent cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vehicle_id.trim().is_empty() {
            return Err(ConfigError::EmptyVehicleId);
        }
        if !(MIN_TELEMETRY_HZ..=MAX_TELEMETRY_HZ).contains(&self.telemetry_frequency_hz) {
            return Err(ConfigError::FrequencyOutOfRange(self.telemetry_frequency_hz));
        }
        if !(-90.0..=90.0).contains(&self.initial_latitude)
            || !(-180.0..=180.0).contains(&self.initial_longitude)
        {
            return Err(ConfigError::CoordinatesOutOfRange(
                self.initial_latitude,
                self.initial_longitude,
            ));
        }
        Ok(())
    }

    /// Seconds between ticks at the configured frequency
    pub fn tick_interval_secs(&self) -> f64 {
        1.0 / self.telemetry_frequency_hz
    }
}

/// Configuration for the orchestrator service
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Fleet identifier used when publishing per-vehicle commands
    pub fleet_id: String,
    /// HTTP server bind address
    pub server_addr: String,
    /// Command queue depth for the owner task
    pub channel_buffer_size: usize,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            fleet_id: std::env::var("AEGIS_FLEET_ID").unwrap_or_else(|_| "fleet01".to_string()),
            server_addr: std::env::var("AEGIS_SERVER_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            channel_buffer_size: 1024,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fleet_id: "fleet01".to_string(),
            server_addr: "0.0.0.0:8080".to_string(),
            channel_buffer_size: 1024,
        }
    }
}
