//! Configuration clamping.
//!
//! Out-of-range values never abort startup: each one is replaced with a safe
//! default and reported so the caller can log it.

use heapless::Vec;

use crate::error::ConfigError;

use super::motor::{MotorConfig, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED};
use super::system::{RouterConfig, DEFAULT_TOOL_COUNT, MAX_TOOLS, MIN_TOOLS};
use super::units::{Millimeters, Steps, StepsPerSec};

/// Report of every value replaced by [`sanitize_config`].
pub type ClampReport = Vec<ConfigError, 32>;

/// Accepted step-rate range.
pub const SPEED_RANGE: (f32, f32) = (1.0, 10_000.0);

/// Accepted acceleration range.
pub const ACCELERATION_RANGE: (f32, f32) = (200.0, 15_000.0);

/// Longest accepted pushback settling delay.
pub const MAX_PUSHBACK_DELAY_MS: u32 = 10_000;

/// Clamp every out-of-range value in `config` to a safe default.
///
/// Returns the list of replacements. An empty report means the configuration
/// was used as written.
pub fn sanitize_config(config: &mut RouterConfig) -> ClampReport {
    let mut report = ClampReport::new();
    let defaults = RouterConfig::default();

    if config.tool_count < MIN_TOOLS || config.tool_count > MAX_TOOLS {
        note(
            &mut report,
            "tool_count",
            config.tool_count as f32,
            DEFAULT_TOOL_COUNT as f32,
        );
        config.tool_count = DEFAULT_TOOL_COUNT;
    }

    if negative(config.bowden_length.0) {
        note(&mut report, "bowden_length", config.bowden_length.0, 0.0);
        config.bowden_length = Millimeters(0.0);
    }

    // Selector
    if not_positive(config.selector.steps_per_mm) {
        note(
            &mut report,
            "selector.steps_per_mm",
            config.selector.steps_per_mm,
            defaults.selector.steps_per_mm,
        );
        config.selector.steps_per_mm = defaults.selector.steps_per_mm;
    }
    clamp_motor(&mut report, &SELECTOR_FIELDS, &mut config.selector.motor);

    // Revolver
    if config.revolver.steps_per_revolution == 0 {
        note(
            &mut report,
            "revolver.steps_per_revolution",
            0.0,
            defaults.revolver.steps_per_revolution as f32,
        );
        config.revolver.steps_per_revolution = defaults.revolver.steps_per_revolution;
    }
    let revolution = config.revolver.steps_per_revolution as i32;
    if config.revolver.offset.0 < 0 || config.revolver.offset.0 > revolution {
        note(
            &mut report,
            "revolver.offset",
            config.revolver.offset.0 as f32,
            0.0,
        );
        config.revolver.offset = Steps(0);
    }
    if let Some(spacing) = config.revolver.spacing {
        if spacing.0 <= 0 || spacing.0 > revolution {
            let fallback = (config.revolver.steps_per_revolution / 10) as f32;
            note(&mut report, "revolver.spacing", spacing.0 as f32, fallback);
            config.revolver.spacing = None;
        }
    }
    clamp_motor(&mut report, &REVOLVER_FIELDS, &mut config.revolver.motor);

    // Feeder
    if not_positive(config.feeder.steps_per_mm) {
        note(
            &mut report,
            "feeder.steps_per_mm",
            config.feeder.steps_per_mm,
            defaults.feeder.steps_per_mm,
        );
        config.feeder.steps_per_mm = defaults.feeder.steps_per_mm;
    }
    clamp_motor(&mut report, &FEEDER_FIELDS, &mut config.feeder.motor);
    if let Some(speed) = config.feeder.insert_speed {
        if !in_range(speed.0, SPEED_RANGE) {
            let fallback = config.feeder.motor.max_speed.0;
            note(&mut report, "feeder.insert_speed", speed.0, fallback);
            config.feeder.insert_speed = None;
        }
    }
    if config.feeder.pushback_delay_ms > MAX_PUSHBACK_DELAY_MS {
        note(
            &mut report,
            "feeder.pushback_delay_ms",
            config.feeder.pushback_delay_ms as f32,
            0.0,
        );
        config.feeder.pushback_delay_ms = 0;
    }
    if config.feeder.load_attempts == 0 {
        note(
            &mut report,
            "feeder.load_attempts",
            0.0,
            defaults.feeder.load_attempts as f32,
        );
        config.feeder.load_attempts = defaults.feeder.load_attempts;
    }
    if config.feeder.unload_attempts == 0 {
        note(
            &mut report,
            "feeder.unload_attempts",
            0.0,
            defaults.feeder.unload_attempts as f32,
        );
        config.feeder.unload_attempts = defaults.feeder.unload_attempts;
    }
    if not_positive(config.feeder.load_increment.0) {
        note(
            &mut report,
            "feeder.load_increment",
            config.feeder.load_increment.0,
            defaults.feeder.load_increment.0,
        );
        config.feeder.load_increment = defaults.feeder.load_increment;
    }
    if not_positive(config.feeder.unload_increment.0) {
        note(
            &mut report,
            "feeder.unload_increment",
            config.feeder.unload_increment.0,
            defaults.feeder.unload_increment.0,
        );
        config.feeder.unload_increment = defaults.feeder.unload_increment;
    }
    for (field, length) in [
        ("feeder.reinforce_length", &mut config.feeder.reinforce_length),
        ("feeder.unload_retract", &mut config.feeder.unload_retract),
        ("feeder.unload_pushback", &mut config.feeder.unload_pushback),
        ("feeder.jam_relief", &mut config.feeder.jam_relief),
    ] {
        if negative(length.0) {
            note(&mut report, field, length.0, 0.0);
            *length = Millimeters(0.0);
        }
    }

    report
}

fn clamp_motor(report: &mut ClampReport, names: &MotorFields, motor: &mut MotorConfig) {
    if !in_range(motor.max_speed.0, SPEED_RANGE) {
        note(report, names.max_speed, motor.max_speed.0, DEFAULT_MAX_SPEED);
        motor.max_speed = StepsPerSec(DEFAULT_MAX_SPEED);
    }
    if !in_range(motor.acceleration.0, ACCELERATION_RANGE) {
        note(
            report,
            names.acceleration,
            motor.acceleration.0,
            DEFAULT_ACCELERATION,
        );
        motor.acceleration.0 = DEFAULT_ACCELERATION;
    }
    if let Some(speed) = motor.homing_speed {
        if !in_range(speed.0, SPEED_RANGE) {
            let fallback = motor.max_speed.0 * 0.5;
            note(report, names.homing_speed, speed.0, fallback);
            motor.homing_speed = None;
        }
    }
    if let Some(travel) = motor.homing_travel {
        if not_positive(travel) {
            note(report, names.homing_travel, travel, 0.0);
            motor.homing_travel = None;
        }
    }
}

/// Check a value against an inclusive range (NaN is never in range).
#[inline]
pub fn in_range(value: f32, (min, max): (f32, f32)) -> bool {
    value >= min && value <= max
}

fn negative(value: f32) -> bool {
    value.is_nan() || value < 0.0
}

fn not_positive(value: f32) -> bool {
    value.is_nan() || value <= 0.0
}

struct MotorFields {
    max_speed: &'static str,
    acceleration: &'static str,
    homing_speed: &'static str,
    homing_travel: &'static str,
}

const SELECTOR_FIELDS: MotorFields = MotorFields {
    max_speed: "selector.motor.max_speed",
    acceleration: "selector.motor.acceleration",
    homing_speed: "selector.motor.homing_speed",
    homing_travel: "selector.motor.homing_travel",
};

const REVOLVER_FIELDS: MotorFields = MotorFields {
    max_speed: "revolver.motor.max_speed",
    acceleration: "revolver.motor.acceleration",
    homing_speed: "revolver.motor.homing_speed",
    homing_travel: "revolver.motor.homing_travel",
};

const FEEDER_FIELDS: MotorFields = MotorFields {
    max_speed: "feeder.motor.max_speed",
    acceleration: "feeder.motor.acceleration",
    homing_speed: "feeder.motor.homing_speed",
    homing_travel: "feeder.motor.homing_travel",
};

fn note(report: &mut ClampReport, field: &'static str, value: f32, replaced_with: f32) {
    // A full report only loses entries, the values are still clamped.
    let _ = report.push(ConfigError::OutOfRange {
        field,
        value,
        replaced_with,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_clean() {
        let mut config = RouterConfig::default();
        assert!(sanitize_config(&mut config).is_empty());
    }

    #[test]
    fn test_tool_count_reset() {
        let mut config = RouterConfig::default();
        config.tool_count = 13;

        let report = sanitize_config(&mut config);

        assert_eq!(config.tool_count, DEFAULT_TOOL_COUNT);
        assert!(matches!(
            report.first(),
            Some(ConfigError::OutOfRange { field: "tool_count", .. })
        ));
    }

    #[test]
    fn test_motor_field_names() {
        let mut config = RouterConfig::default();
        config.revolver.motor.acceleration.0 = 50.0;

        let report = sanitize_config(&mut config);

        assert_eq!(config.revolver.motor.acceleration.0, DEFAULT_ACCELERATION);
        assert!(matches!(
            report.first(),
            Some(ConfigError::OutOfRange {
                field: "revolver.motor.acceleration",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_is_out_of_range() {
        assert!(!in_range(f32::NAN, SPEED_RANGE));
        assert!(in_range(10_000.0, SPEED_RANGE));
    }
}
