//! Threshold bands driving predictive alert generation
//!
//! Each metric has a `(normal, warning, critical)` tripartition; the warning
//! band widens the time-to-failure window, the critical band narrows it and
//! marks the vehicle unsafe to operate.

/// Thresholds for vehicle anomaly detection
pub mod alert_thresholds {
    // === Engine Thermals ===
    /// Engine temperature above this is a warning (Celsius)
    pub const ENGINE_TEMP_WARNING: f64 = 105.0;
    /// Engine temperature above this is critical (Celsius)
    pub const ENGINE_TEMP_CRITICAL: f64 = 120.0;

    // === Electrical Subsystem ===
    /// Battery voltage below this is a warning (V)
    pub const BATTERY_VOLTAGE_WARNING: f64 = 12.0;
    /// Battery voltage below this is critical (V)
    pub const BATTERY_VOLTAGE_CRITICAL: f64 = 11.5;
    /// Alternator output below this means it is not charging properly (V)
    pub const ALTERNATOR_VOLTAGE_WARNING: f64 = 13.5;
    /// Alternator output below this means the battery is discharging (V)
    pub const ALTERNATOR_VOLTAGE_CRITICAL: f64 = 13.0;
    /// Battery state-of-charge warning threshold (%)
    pub const BATTERY_SOC_WARNING: f64 = 40.0;
    /// Battery state-of-charge critical threshold (%)
    pub const BATTERY_SOC_CRITICAL: f64 = 20.0;

    // === Fuel ===
    /// Fuel level warning threshold (%)
    pub const FUEL_LEVEL_WARNING: f64 = 15.0;
    /// Fuel level critical threshold (%)
    pub const FUEL_LEVEL_CRITICAL: f64 = 5.0;

    // === Brakes (per wheel) ===
    /// Brake pad thickness warning threshold (mm)
    pub const BRAKE_PAD_WARNING: f64 = 3.0;
    /// Brake pad thickness critical threshold (mm) - metal-on-metal imminent
    pub const BRAKE_PAD_CRITICAL: f64 = 1.5;

    // === Tires (per wheel) ===
    /// Tire pressure warning threshold (psi)
    pub const TIRE_PRESSURE_WARNING: f64 = 60.0;
    /// Tire pressure critical threshold (psi)
    pub const TIRE_PRESSURE_CRITICAL: f64 = 40.0;
}

#[cfg(test)]
mod tests {
    use super::alert_thresholds::*;

    #[test]
    fn test_warning_bands_enclose_critical_bands() {
        // High-is-bad metrics
        assert!(ENGINE_TEMP_WARNING < ENGINE_TEMP_CRITICAL);
        // Low-is-bad metrics
        assert!(BATTERY_VOLTAGE_WARNING > BATTERY_VOLTAGE_CRITICAL);
        assert!(ALTERNATOR_VOLTAGE_WARNING > ALTERNATOR_VOLTAGE_CRITICAL);
        assert!(BATTERY_SOC_WARNING > BATTERY_SOC_CRITICAL);
        assert!(FUEL_LEVEL_WARNING > FUEL_LEVEL_CRITICAL);
        assert!(BRAKE_PAD_WARNING > BRAKE_PAD_CRITICAL);
        assert!(TIRE_PRESSURE_WARNING > TIRE_PRESSURE_CRITICAL);
    }
}
