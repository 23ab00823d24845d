//! Per-tick vehicle sensor snapshot
//!
//! The rich telemetry shape: location and movement, engine thermals, the
//! electrical subsystem, fuel, and per-wheel brake and tire readings. Records
//! are immutable once published; consumers may reject out-of-range values via
//! [`VehicleTelemetry::validate`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vehicle::GeoLocation;

/// Wheel identifier for per-wheel metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelPosition {
    pub const ALL: [WheelPosition; 4] = [
        WheelPosition::FrontLeft,
        WheelPosition::FrontRight,
        WheelPosition::RearLeft,
        WheelPosition::RearRight,
    ];

    pub fn is_front(self) -> bool {
        matches!(self, WheelPosition::FrontLeft | WheelPosition::FrontRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WheelPosition::FrontLeft => "front_left",
            WheelPosition::FrontRight => "front_right",
            WheelPosition::RearLeft => "rear_left",
            WheelPosition::RearRight => "rear_right",
        }
    }
}

impl std::fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Three-axis chassis vibration in g
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VibrationG {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// High-frequency sensor data for one vehicle at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTelemetry {
    pub vehicle_id: String,
    /// Monotonically increasing per agent
    pub sequence_number: u64,
    pub timestamp: DateTime<Utc>,

    // Location & movement
    pub location: GeoLocation,
    /// Total distance traveled in km
    pub odometer_km: f64,

    // Engine thermals
    /// Engine temperature in Celsius, [-40, 150]
    pub engine_temp_celsius: f64,
    /// Coolant temperature in Celsius, [-40, 150]
    pub coolant_temp_celsius: f64,
    /// Engine speed in RPM
    pub engine_rpm: f64,

    // Electrical subsystem
    /// Battery terminal voltage in volts, [0, 30]
    pub battery_voltage: f64,
    /// Alternator output voltage in volts, [0, 30]
    pub alternator_voltage: f64,
    /// Battery state of charge, [0, 100]
    pub battery_soc_percent: f64,

    // Fuel
    /// Fuel level, [0, 100]
    pub fuel_level_percent: f64,

    // Per-wheel readings
    /// Tire pressure in psi per wheel, [0, 200]
    pub tire_pressure_psi: BTreeMap<WheelPosition, f64>,
    /// Brake pad thickness in mm per wheel, [0, 25]
    pub brake_pad_thickness_mm: BTreeMap<WheelPosition, f64>,
    /// Brake system temperature in Celsius, [-40, 300]
    pub brake_temp_celsius: f64,

    // Chassis
    pub vibration_g: VibrationG,
}

/// Out-of-range telemetry field, rejected at the entry point
#[derive(Debug, Error)]
#[error("telemetry field {field} out of range: {value} not in [{min}, {max}]")]
pub struct TelemetryRangeError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), TelemetryRangeError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TelemetryRangeError {
            field,
            value,
            min,
            max,
        })
    }
}

impl VehicleTelemetry {
    /// Check every numeric field against its declared physical range.
    ///
    /// Consumers reject records that fail this check; a valid record never
    /// produces NaN downstream.
    pub fn validate(&self) -> Result<(), TelemetryRangeError> {
        check_range("latitude", self.location.latitude, -90.0, 90.0)?;
        check_range("longitude", self.location.longitude, -180.0, 180.0)?;
        check_range("heading", self.location.heading, 0.0, 360.0)?;
        check_range("speed_kmh", self.location.speed_kmh, 0.0, 500.0)?;
        check_range("odometer_km", self.odometer_km, 0.0, f64::MAX)?;
        check_range("engine_temp_celsius", self.engine_temp_celsius, -40.0, 150.0)?;
        check_range("coolant_temp_celsius", self.coolant_temp_celsius, -40.0, 150.0)?;
        check_range("engine_rpm", self.engine_rpm, 0.0, 10_000.0)?;
        check_range("battery_voltage", self.battery_voltage, 0.0, 30.0)?;
        check_range("alternator_voltage", self.alternator_voltage, 0.0, 30.0)?;
        check_range("battery_soc_percent", self.battery_soc_percent, 0.0, 100.0)?;
        check_range("fuel_level_percent", self.fuel_level_percent, 0.0, 100.0)?;
        check_range("brake_temp_celsius", self.brake_temp_celsius, -40.0, 300.0)?;
        for (wheel, psi) in &self.tire_pressure_psi {
            check_range(wheel.as_str(), *psi, 0.0, 200.0)
                .map_err(|e| TelemetryRangeError { field: "tire_pressure_psi", ..e })?;
        }
        for (wheel, mm) in &self.brake_pad_thickness_mm {
            check_range(wheel.as_str(), *mm, 0.0, 25.0)
                .map_err(|e| TelemetryRangeError { field: "brake_pad_thickness_mm", ..e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_telemetry() -> VehicleTelemetry {
        let now = Utc::now();
        VehicleTelemetry {
            vehicle_id: "AMB-001".to_string(),
            sequence_number: 1,
            timestamp: now,
            location: GeoLocation::new(19.4326, -99.1332, now),
            odometer_km: 45_678.9,
            engine_temp_celsius: 90.0,
            coolant_temp_celsius: 85.0,
            engine_rpm: 800.0,
            battery_voltage: 13.8,
            alternator_voltage: 14.2,
            battery_soc_percent: 95.0,
            fuel_level_percent: 75.0,
            tire_pressure_psi: WheelPosition::ALL.iter().map(|w| (*w, 80.0)).collect(),
            brake_pad_thickness_mm: WheelPosition::ALL
                .iter()
                .map(|w| (*w, if w.is_front() { 8.0 } else { 9.0 }))
                .collect(),
            brake_temp_celsius: 40.0,
            vibration_g: VibrationG::default(),
        }
    }

    #[test]
    fn test_valid_telemetry_passes() {
        assert!(sample_telemetry().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut t = sample_telemetry();
        t.engine_temp_celsius = 151.0;
        let err = t.validate().unwrap_err();
        assert_eq!(err.field, "engine_temp_celsius");

        let mut t = sample_telemetry();
        t.battery_voltage = -0.1;
        assert!(t.validate().is_err());

        let mut t = sample_telemetry();
        t.fuel_level_percent = f64::NAN;
        assert!(t.validate().is_err());

        let mut t = sample_telemetry();
        t.tire_pressure_psi.insert(WheelPosition::RearLeft, 250.0);
        assert_eq!(t.validate().unwrap_err().field, "tire_pressure_psi");
    }

    #[test]
    fn test_wheel_serde_keys() {
        let t = sample_telemetry();
        let json = serde_json::to_value(&t).unwrap();
        assert!(json["tire_pressure_psi"]["front_left"].is_number());
        assert!(json["brake_pad_thickness_mm"]["rear_right"].is_number());

        let back: VehicleTelemetry = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}
