//! Failure scenario injection
//!
//! Deterministically overrides telemetry fields to simulate component
//! degradations. Each scenario progresses linearly in elapsed minutes since
//! activation, so the same activation time and clock always produce the same
//! telemetry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{VehicleTelemetry, WheelPosition};

/// Predefined failure modes for simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureScenario {
    EngineOverheat,
    AlternatorFailure,
    BrakePadWear,
    TirePressureLow,
    BatteryDegradation,
    FuelLeak,
}

impl FailureScenario {
    pub const ALL: [FailureScenario; 6] = [
        FailureScenario::EngineOverheat,
        FailureScenario::AlternatorFailure,
        FailureScenario::BrakePadWear,
        FailureScenario::TirePressureLow,
        FailureScenario::BatteryDegradation,
        FailureScenario::FuelLeak,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureScenario::EngineOverheat => "engine_overheat",
            FailureScenario::AlternatorFailure => "alternator_failure",
            FailureScenario::BrakePadWear => "brake_pad_wear",
            FailureScenario::TirePressureLow => "tire_pressure_low",
            FailureScenario::BatteryDegradation => "battery_degradation",
            FailureScenario::FuelLeak => "fuel_leak",
        }
    }
}

impl std::fmt::Display for FailureScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FailureScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|scenario| scenario.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown failure scenario: {}", s))
    }
}

/// Injects active failure scenarios into vehicle telemetry.
///
/// Scenarios are applied in activation order; activating an already-active
/// scenario keeps its original activation time.
#[derive(Debug, Default)]
pub struct FailureInjector {
    active: Vec<(FailureScenario, DateTime<Utc>)>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a scenario starting at `now`
    pub fn activate(&mut self, scenario: FailureScenario, now: DateTime<Utc>) {
        if self.active.iter().any(|(s, _)| *s == scenario) {
            return;
        }
        info!(scenario = %scenario, "Failure scenario activated");
        self.active.push((scenario, now));
    }

    /// Deactivate a scenario; no-op if not active
    pub fn deactivate(&mut self, scenario: FailureScenario) {
        self.active.retain(|(s, _)| *s != scenario);
    }

    /// Currently active scenarios in activation order
    pub fn active_scenarios(&self) -> Vec<FailureScenario> {
        self.active.iter().map(|(s, _)| *s).collect()
    }

    /// Minutes since a scenario was activated, or 0.0 when inactive
    pub fn elapsed_minutes(&self, scenario: FailureScenario, now: DateTime<Utc>) -> f64 {
        self.active
            .iter()
            .find(|(s, _)| *s == scenario)
            .map(|(_, activated)| {
                let elapsed = now.signed_duration_since(*activated);
                (elapsed.num_milliseconds() as f64 / 60_000.0).max(0.0)
            })
            .unwrap_or(0.0)
    }

    /// Apply every active scenario's progression to a telemetry record
    pub fn apply(&self, telemetry: &mut VehicleTelemetry, now: DateTime<Utc>) {
        for (scenario, activated) in &self.active {
            let elapsed = now.signed_duration_since(*activated);
            let m = (elapsed.num_milliseconds() as f64 / 60_000.0).max(0.0);
            match scenario {
                FailureScenario::EngineOverheat => {
                    telemetry.engine_temp_celsius = (90.0 + 2.0 * m).min(150.0);
                    telemetry.coolant_temp_celsius = (85.0 + 2.5 * m).min(150.0);
                }
                FailureScenario::AlternatorFailure => {
                    telemetry.alternator_voltage = (14.2 - 0.02 * m).max(11.5);
                    telemetry.battery_soc_percent = (100.0 - 3.0 * m).max(0.0);
                    telemetry.battery_voltage = 11.5 + telemetry.battery_soc_percent * 0.025;
                }
                FailureScenario::BrakePadWear => {
                    for (wheel, thickness) in telemetry.brake_pad_thickness_mm.iter_mut() {
                        *thickness = if wheel.is_front() {
                            (8.0 - 0.065 * m).max(0.0)
                        } else {
                            (9.0 - 0.05 * m).max(0.0)
                        };
                    }
                    telemetry.brake_temp_celsius = (40.0 + 0.5 * m).min(120.0);
                }
                FailureScenario::TirePressureLow => {
                    telemetry
                        .tire_pressure_psi
                        .insert(WheelPosition::FrontLeft, (80.0 - 2.0 * m).max(0.0));
                    telemetry.vibration_g.z += (0.02 * m).min(0.5);
                }
                FailureScenario::BatteryDegradation => {
                    telemetry.battery_voltage = (13.8 - 0.02 * m).max(0.0);
                }
                FailureScenario::FuelLeak => {
                    telemetry.fuel_level_percent = (75.0 - 5.0 * m).max(0.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::agent::TelemetryGenerator;
    use crate::config::AgentConfig;
    use crate::types::VehicleType;

    fn baseline_telemetry(now: DateTime<Utc>) -> VehicleTelemetry {
        let config = AgentConfig::new("AMB-001", VehicleType::Ambulance).with_seed(1);
        TelemetryGenerator::new(&config).generate(now)
    }

    #[test]
    fn test_engine_overheat_progression() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::EngineOverheat, start);

        // At 5 minutes: 90 + 10 = 100C, below the warning band
        let at_5 = start + Duration::minutes(5);
        let mut t = baseline_telemetry(at_5);
        injector.apply(&mut t, at_5);
        assert!((t.engine_temp_celsius - 100.0).abs() < 1e-9);

        // At 15 minutes: 90 + 30 = 120C, at the critical threshold
        let at_15 = start + Duration::minutes(15);
        let mut t = baseline_telemetry(at_15);
        injector.apply(&mut t, at_15);
        assert!((t.engine_temp_celsius - 120.0).abs() < 1e-9);
        assert!((t.coolant_temp_celsius - (85.0 + 2.5 * 15.0)).abs() < 1e-9);

        // Caps at 150C
        let at_60 = start + Duration::minutes(60);
        let mut t = baseline_telemetry(at_60);
        injector.apply(&mut t, at_60);
        assert!((t.engine_temp_celsius - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_alternator_failure_couples_battery_to_soc() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::AlternatorFailure, start);

        let at_20 = start + Duration::minutes(20);
        let mut t = baseline_telemetry(at_20);
        injector.apply(&mut t, at_20);

        assert!((t.alternator_voltage - (14.2 - 0.4)).abs() < 1e-9);
        assert!((t.battery_soc_percent - 40.0).abs() < 1e-9);
        assert!((t.battery_voltage - (11.5 + 40.0 * 0.025)).abs() < 1e-9);

        // Alternator floors at 11.5V, SoC floors at 0
        let at_300 = start + Duration::minutes(300);
        let mut t = baseline_telemetry(at_300);
        injector.apply(&mut t, at_300);
        assert!((t.alternator_voltage - 11.5).abs() < 1e-9);
        assert!((t.battery_soc_percent - 0.0).abs() < 1e-9);
        assert!((t.battery_voltage - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_brake_pad_wear_front_faster_than_rear() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::BrakePadWear, start);

        let at_100 = start + Duration::minutes(100);
        let mut t = baseline_telemetry(at_100);
        injector.apply(&mut t, at_100);

        let front = t.brake_pad_thickness_mm[&WheelPosition::FrontLeft];
        let rear = t.brake_pad_thickness_mm[&WheelPosition::RearLeft];
        assert!((front - (8.0 - 6.5)).abs() < 1e-9);
        assert!((rear - (9.0 - 5.0)).abs() < 1e-9);
        assert!((t.brake_temp_celsius - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_tire_pressure_low_affects_front_left_only() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::TirePressureLow, start);

        let at_10 = start + Duration::minutes(10);
        let mut t = baseline_telemetry(at_10);
        let front_right_before = t.tire_pressure_psi[&WheelPosition::FrontRight];
        injector.apply(&mut t, at_10);

        assert!((t.tire_pressure_psi[&WheelPosition::FrontLeft] - 60.0).abs() < 1e-9);
        assert!(
            (t.tire_pressure_psi[&WheelPosition::FrontRight] - front_right_before).abs()
                < f64::EPSILON
        );
        // Vibration increase caps at 0.5 g
        assert!(t.vibration_g.z > 0.0);
    }

    #[test]
    fn test_fuel_leak_and_battery_degradation_floors() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::FuelLeak, start);
        injector.activate(FailureScenario::BatteryDegradation, start);

        let at_20 = start + Duration::minutes(20);
        let mut t = baseline_telemetry(at_20);
        injector.apply(&mut t, at_20);
        assert!((t.fuel_level_percent - 0.0).abs() < 1e-9); // 75 - 100 floored
        assert!((t.battery_voltage - (13.8 - 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_activate_is_idempotent_and_deactivate_removes() {
        let start = Utc::now();
        let mut injector = FailureInjector::new();
        injector.activate(FailureScenario::FuelLeak, start);
        // Re-activation keeps the original activation time
        injector.activate(FailureScenario::FuelLeak, start + Duration::minutes(5));
        assert_eq!(injector.active_scenarios().len(), 1);

        let at_10 = start + Duration::minutes(10);
        assert!((injector.elapsed_minutes(FailureScenario::FuelLeak, at_10) - 10.0).abs() < 1e-6);

        injector.deactivate(FailureScenario::FuelLeak);
        assert!(injector.active_scenarios().is_empty());
        assert_eq!(injector.elapsed_minutes(FailureScenario::FuelLeak, at_10), 0.0);

        // Deactivating an inactive scenario is a no-op
        injector.deactivate(FailureScenario::EngineOverheat);
    }

    #[test]
    fn test_scenario_round_trips_from_str() {
        for scenario in FailureScenario::ALL {
            let parsed: FailureScenario = scenario.as_str().parse().unwrap();
            assert_eq!(parsed, scenario);
        }
        assert!("warp_core_breach".parse::<FailureScenario>().is_err());
    }
}
