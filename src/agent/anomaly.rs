//! Threshold-based anomaly detection
//!
//! Pure rule evaluation over one telemetry record: the same input always
//! yields the same alerts (modulo generated alert IDs and timestamps).
//! Warning-band crossings predict a wide failure window and leave the vehicle
//! operable; critical-band crossings narrow the window and mark the vehicle
//! unsafe to operate. Independent metrics produce independent alerts, and
//! per-wheel metrics produce one alert per crossing wheel.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::types::thresholds::alert_thresholds as th;
use crate::types::{
    AlertSeverity, FailureCategory, PredictiveAlert, VehicleTelemetry,
};

/// Rule-based anomaly detection for one vehicle's telemetry stream
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    vehicle_id: String,
}

impl AnomalyDetector {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
        }
    }

    /// Analyze a telemetry record and return alerts for every threshold
    /// crossing (may be empty).
    pub fn analyze(&self, telemetry: &VehicleTelemetry) -> Vec<PredictiveAlert> {
        let mut alerts = Vec::new();
        self.check_engine_temp(telemetry, &mut alerts);
        self.check_battery_voltage(telemetry, &mut alerts);
        self.check_alternator(telemetry, &mut alerts);
        self.check_battery_soc(telemetry, &mut alerts);
        self.check_fuel_level(telemetry, &mut alerts);
        self.check_brake_pads(telemetry, &mut alerts);
        self.check_tire_pressure(telemetry, &mut alerts);
        alerts
    }

    fn alert(
        &self,
        severity: AlertSeverity,
        category: FailureCategory,
        component: impl Into<String>,
        params: AlertParams,
        contributing_factors: Vec<String>,
        related_telemetry: BTreeMap<String, f64>,
    ) -> PredictiveAlert {
        PredictiveAlert {
            alert_id: PredictiveAlert::new_alert_id(),
            vehicle_id: self.vehicle_id.clone(),
            timestamp: Utc::now(),
            severity,
            category,
            component: component.into(),
            failure_probability: params.probability,
            confidence: params.confidence,
            predicted_failure_min_hours: params.window.0,
            predicted_failure_likely_hours: params.window.1,
            predicted_failure_max_hours: params.window.2,
            can_complete_current_mission: params.can_complete_mission,
            safe_to_operate: params.safe_to_operate,
            recommended_action: params.action,
            contributing_factors,
            related_telemetry,
        }
    }

    fn check_engine_temp(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        let temp = t.engine_temp_celsius;
        let related = BTreeMap::from([
            ("engine_temp_celsius".to_string(), temp),
            ("coolant_temp_celsius".to_string(), t.coolant_temp_celsius),
            ("engine_rpm".to_string(), t.engine_rpm),
        ]);

        if temp > th::ENGINE_TEMP_CRITICAL {
            alerts.push(self.alert(
                AlertSeverity::Critical,
                FailureCategory::Engine,
                "engine",
                AlertParams {
                    probability: 0.95,
                    confidence: 0.98,
                    window: (0.5, 1.0, 2.0),
                    can_complete_mission: false,
                    safe_to_operate: false,
                    action: "STOP IMMEDIATELY - Engine damage imminent. Activate limp mode."
                        .to_string(),
                },
                vec![
                    format!(
                        "engine_temp_celsius={:.1}C (critical threshold {}C)",
                        temp,
                        th::ENGINE_TEMP_CRITICAL
                    ),
                    format!("coolant_temp={:.1}C", t.coolant_temp_celsius),
                ],
                related,
            ));
        } else if temp > th::ENGINE_TEMP_WARNING {
            alerts.push(self.alert(
                AlertSeverity::Warning,
                FailureCategory::Engine,
                "engine",
                AlertParams {
                    probability: 0.65,
                    confidence: 0.85,
                    window: (2.0, 4.0, 8.0),
                    can_complete_mission: true,
                    safe_to_operate: true,
                    action: "Reduce RPM and monitor temperature. Schedule inspection within 4 hours."
                        .to_string(),
                },
                vec![format!(
                    "engine_temp_celsius={:.1}C (warning threshold {}C)",
                    temp,
                    th::ENGINE_TEMP_WARNING
                )],
                related,
            ));
        }
    }

    fn check_battery_voltage(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        let voltage = t.battery_voltage;
        let related = BTreeMap::from([
            ("battery_voltage".to_string(), voltage),
            ("alternator_voltage".to_string(), t.alternator_voltage),
            ("battery_soc_percent".to_string(), t.battery_soc_percent),
        ]);

        if voltage < th::BATTERY_VOLTAGE_CRITICAL {
            alerts.push(self.alert(
                AlertSeverity::Critical,
                FailureCategory::Electrical,
                "battery",
                AlertParams {
                    probability: 0.90,
                    confidence: 0.95,
                    window: (0.25, 0.5, 1.0),
                    can_complete_mission: false,
                    safe_to_operate: false,
                    action: "Battery voltage critically low - vehicle may stall. Return to base immediately."
                        .to_string(),
                },
                vec![format!(
                    "battery_voltage={:.2}V (critical threshold {}V)",
                    voltage,
                    th::BATTERY_VOLTAGE_CRITICAL
                )],
                related,
            ));
        } else if voltage < th::BATTERY_VOLTAGE_WARNING {
            alerts.push(self.alert(
                AlertSeverity::Warning,
                FailureCategory::Electrical,
                "battery",
                AlertParams {
                    probability: 0.55,
                    confidence: 0.85,
                    window: (2.0, 4.0, 8.0),
                    can_complete_mission: true,
                    safe_to_operate: true,
                    action: "Battery voltage low - check charging system and battery health."
                        .to_string(),
                },
                vec![format!(
                    "battery_voltage={:.2}V (warning threshold {}V)",
                    voltage,
                    th::BATTERY_VOLTAGE_WARNING
                )],
                related,
            ));
        }
    }

    fn check_alternator(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        let voltage = t.alternator_voltage;
        let related = BTreeMap::from([
            ("alternator_voltage".to_string(), voltage),
            ("battery_voltage".to_string(), t.battery_voltage),
            ("battery_soc_percent".to_string(), t.battery_soc_percent),
        ]);

        if voltage < th::ALTERNATOR_VOLTAGE_CRITICAL {
            alerts.push(self.alert(
                AlertSeverity::Critical,
                FailureCategory::Electrical,
                "alternator",
                AlertParams {
                    probability: 0.85,
                    confidence: 0.90,
                    window: (1.0, 2.0, 4.0),
                    // The battery can carry the current mission
                    can_complete_mission: true,
                    safe_to_operate: false,
                    action: "Alternator not charging - battery will drain. Replace alternator within 2 hours."
                        .to_string(),
                },
                vec![
                    format!(
                        "alternator_voltage={:.2}V (critical threshold {}V)",
                        voltage,
                        th::ALTERNATOR_VOLTAGE_CRITICAL
                    ),
                    format!("battery_soc={:.1}%", t.battery_soc_percent),
                ],
                related,
            ));
        } else if voltage < th::ALTERNATOR_VOLTAGE_WARNING {
            alerts.push(self.alert(
                AlertSeverity::Warning,
                FailureCategory::Electrical,
                "alternator",
                AlertParams {
                    probability: 0.65,
                    confidence: 0.85,
                    window: (8.0, 12.0, 24.0),
                    can_complete_mission: true,
                    safe_to_operate: true,
                    action: "Alternator output low - schedule inspection within 12 hours."
                        .to_string(),
                },
                vec![format!(
                    "alternator_voltage={:.2}V (warning threshold {}V)",
                    voltage,
                    th::ALTERNATOR_VOLTAGE_WARNING
                )],
                related,
            ));
        }
    }

    fn check_battery_soc(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        let soc = t.battery_soc_percent;
        let related = BTreeMap::from([
            ("battery_soc_percent".to_string(), soc),
            ("battery_voltage".to_string(), t.battery_voltage),
            ("alternator_voltage".to_string(), t.alternator_voltage),
        ]);

        if soc < th::BATTERY_SOC_CRITICAL {
            alerts.push(self.alert(
                AlertSeverity::Critical,
                FailureCategory::Electrical,
                "battery",
                AlertParams {
                    probability: 0.90,
                    confidence: 0.95,
                    window: (0.5, 1.0, 2.0),
                    can_complete_mission: false,
                    safe_to_operate: false,
                    action: "Battery critically low - vehicle may shut down. Return to base immediately."
                        .to_string(),
                },
                vec![format!(
                    "battery_soc={:.1}% (critical threshold {}%)",
                    soc,
                    th::BATTERY_SOC_CRITICAL
                )],
                related,
            ));
        } else if soc < th::BATTERY_SOC_WARNING {
            alerts.push(self.alert(
                AlertSeverity::Warning,
                FailureCategory::Electrical,
                "battery",
                AlertParams {
                    probability: 0.50,
                    confidence: 0.80,
                    window: (2.0, 4.0, 6.0),
                    can_complete_mission: true,
                    safe_to_operate: true,
                    action: "Battery charge low - check charging system and battery health."
                        .to_string(),
                },
                vec![format!(
                    "battery_soc={:.1}% (warning threshold {}%)",
                    soc,
                    th::BATTERY_SOC_WARNING
                )],
                related,
            ));
        }
    }

    fn check_fuel_level(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        let fuel = t.fuel_level_percent;
        let related = BTreeMap::from([("fuel_level_percent".to_string(), fuel)]);

        if fuel < th::FUEL_LEVEL_CRITICAL {
            alerts.push(self.alert(
                AlertSeverity::Critical,
                FailureCategory::Fuel,
                "fuel_system",
                AlertParams {
                    probability: 0.95,
                    confidence: 0.98,
                    window: (0.1, 0.25, 0.5),
                    can_complete_mission: false,
                    safe_to_operate: false,
                    action: "Fuel critically low - refuel immediately or vehicle will strand."
                        .to_string(),
                },
                vec![format!(
                    "fuel_level_percent={:.1}% (critical threshold {}%)",
                    fuel,
                    th::FUEL_LEVEL_CRITICAL
                )],
                related,
            ));
        } else if fuel < th::FUEL_LEVEL_WARNING {
            alerts.push(self.alert(
                AlertSeverity::Warning,
                FailureCategory::Fuel,
                "fuel_system",
                AlertParams {
                    probability: 0.60,
                    confidence: 0.90,
                    window: (0.5, 1.0, 2.0),
                    can_complete_mission: true,
                    safe_to_operate: true,
                    action: "Fuel low - refuel at next opportunity.".to_string(),
                },
                vec![format!(
                    "fuel_level_percent={:.1}% (warning threshold {}%)",
                    fuel,
                    th::FUEL_LEVEL_WARNING
                )],
                related,
            ));
        }
    }

    fn check_brake_pads(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        for (wheel, thickness) in &t.brake_pad_thickness_mm {
            let component = format!("brake_pad_{}", wheel);
            let related = BTreeMap::from([(format!("brake_pad_{}_mm", wheel), *thickness)]);

            if *thickness < th::BRAKE_PAD_CRITICAL {
                alerts.push(self.alert(
                    AlertSeverity::Critical,
                    FailureCategory::Brakes,
                    component,
                    AlertParams {
                        probability: 0.95,
                        confidence: 0.98,
                        window: (0.0, 0.5, 1.0),
                        can_complete_mission: false,
                        safe_to_operate: false,
                        action: format!(
                            "CRITICAL: {} brake pad at {:.1}mm - replace immediately (metal-on-metal imminent).",
                            wheel, thickness
                        ),
                    },
                    vec![format!(
                        "brake_pad_{}={:.1}mm (critical threshold {}mm)",
                        wheel,
                        thickness,
                        th::BRAKE_PAD_CRITICAL
                    )],
                    related,
                ));
            } else if *thickness < th::BRAKE_PAD_WARNING {
                alerts.push(self.alert(
                    AlertSeverity::Warning,
                    FailureCategory::Brakes,
                    component,
                    AlertParams {
                        probability: 0.60,
                        confidence: 0.90,
                        window: (24.0, 48.0, 72.0),
                        can_complete_mission: true,
                        safe_to_operate: true,
                        action: format!(
                            "{} brake pad at {:.1}mm - schedule replacement within 48 hours.",
                            wheel, thickness
                        ),
                    },
                    vec![format!(
                        "brake_pad_{}={:.1}mm (warning threshold {}mm)",
                        wheel,
                        thickness,
                        th::BRAKE_PAD_WARNING
                    )],
                    related,
                ));
            }
        }
    }

    fn check_tire_pressure(&self, t: &VehicleTelemetry, alerts: &mut Vec<PredictiveAlert>) {
        for (wheel, pressure) in &t.tire_pressure_psi {
            let component = format!("tire_{}", wheel);
            let related = BTreeMap::from([(format!("tire_pressure_{}_psi", wheel), *pressure)]);

            if *pressure < th::TIRE_PRESSURE_CRITICAL {
                alerts.push(self.alert(
                    AlertSeverity::Critical,
                    FailureCategory::Tires,
                    component,
                    AlertParams {
                        probability: 0.90,
                        confidence: 0.95,
                        window: (0.0, 0.25, 0.5),
                        can_complete_mission: false,
                        safe_to_operate: false,
                        action: format!(
                            "CRITICAL: {} tire at {:.1} psi - stop and replace immediately.",
                            wheel, pressure
                        ),
                    },
                    vec![format!(
                        "tire_pressure_{}={:.1} psi (critical threshold {} psi)",
                        wheel,
                        pressure,
                        th::TIRE_PRESSURE_CRITICAL
                    )],
                    related,
                ));
            } else if *pressure < th::TIRE_PRESSURE_WARNING {
                alerts.push(self.alert(
                    AlertSeverity::Warning,
                    FailureCategory::Tires,
                    component,
                    AlertParams {
                        probability: 0.50,
                        confidence: 0.85,
                        window: (1.0, 2.0, 4.0),
                        can_complete_mission: true,
                        safe_to_operate: true,
                        action: format!(
                            "{} tire pressure low at {:.1} psi - inspect for leak and refill.",
                            wheel, pressure
                        ),
                    },
                    vec![format!(
                        "tire_pressure_{}={:.1} psi (warning threshold {} psi)",
                        wheel,
                        pressure,
                        th::TIRE_PRESSURE_WARNING
                    )],
                    related,
                ));
            }
        }
    }
}

/// Per-band alert parameters
struct AlertParams {
    probability: f64,
    confidence: f64,
    /// (min, likely, max) predicted hours to failure
    window: (f64, f64, f64),
    can_complete_mission: bool,
    safe_to_operate: bool,
    action: String,
}
