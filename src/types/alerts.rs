//! Predictive maintenance alerts emitted by the anomaly detector

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity level of a predictive alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational only
    Info,
    /// Action needed soon
    Warning,
    /// Immediate action required
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "info"),
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Category of vehicle component failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Engine,
    Electrical,
    Fuel,
    Brakes,
    Tires,
    Other,
}

/// A predicted component failure for one vehicle.
///
/// Immutable once emitted. The three time-to-failure estimates always satisfy
/// `min <= likely <= max`; a critical alert sets `safe_to_operate = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveAlert {
    pub alert_id: String,
    pub vehicle_id: String,
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub category: FailureCategory,
    /// Affected component, e.g. `engine` or `brake_pad_front_left`
    pub component: String,
    /// Probability the component fails inside the predicted window, [0, 1]
    pub failure_probability: f64,
    /// Detector confidence in this prediction, [0, 1]
    pub confidence: f64,
    pub predicted_failure_min_hours: f64,
    pub predicted_failure_likely_hours: f64,
    pub predicted_failure_max_hours: f64,
    pub can_complete_current_mission: bool,
    pub safe_to_operate: bool,
    pub recommended_action: String,
    /// Human-readable factors that triggered the alert
    pub contributing_factors: Vec<String>,
    /// Raw telemetry values the prediction was based on
    pub related_telemetry: BTreeMap<String, f64>,
}

impl PredictiveAlert {
    /// Generate a fresh unique alert ID
    pub fn new_alert_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether probability, confidence, and the failure window are coherent
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.failure_probability)
            && (0.0..=1.0).contains(&self.confidence)
            && self.predicted_failure_min_hours >= 0.0
            && self.predicted_failure_min_hours <= self.predicted_failure_likely_hours
            && self.predicted_failure_likely_hours <= self.predicted_failure_max_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_alert() -> PredictiveAlert {
        PredictiveAlert {
            alert_id: PredictiveAlert::new_alert_id(),
            vehicle_id: "AMB-001".to_string(),
            timestamp: Utc::now(),
            severity: AlertSeverity::Critical,
            category: FailureCategory::Engine,
            component: "engine".to_string(),
            failure_probability: 0.95,
            confidence: 0.98,
            predicted_failure_min_hours: 0.5,
            predicted_failure_likely_hours: 1.0,
            predicted_failure_max_hours: 2.0,
            can_complete_current_mission: false,
            safe_to_operate: false,
            recommended_action: "Stop immediately".to_string(),
            contributing_factors: vec!["engine_temp_celsius=121.0".to_string()],
            related_telemetry: BTreeMap::from([("engine_temp_celsius".to_string(), 121.0)]),
        }
    }

    #[test]
    fn test_alert_well_formed() {
        assert!(make_alert().is_well_formed());

        let mut bad = make_alert();
        bad.predicted_failure_min_hours = 3.0;
        assert!(!bad.is_well_formed());

        let mut bad = make_alert();
        bad.failure_probability = 1.2;
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn test_alert_ids_unique() {
        assert_ne!(
            PredictiveAlert::new_alert_id(),
            PredictiveAlert::new_alert_id()
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
        assert!(AlertSeverity::Warning > AlertSeverity::Info);
    }

    #[test]
    fn test_severity_serde_strings() {
        assert_eq!(
            serde_json::to_string(&AlertSeverity::Critical).unwrap(),
            "\"critical\""
        );
        let parsed: FailureCategory = serde_json::from_str("\"brakes\"").unwrap();
        assert_eq!(parsed, FailureCategory::Brakes);
    }
}
