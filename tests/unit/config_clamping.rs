//! Unit tests for clamping out-of-range configuration values.

use filament_router::config::{
    parse_config, sanitize_config, RouterConfig, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED,
    DEFAULT_TOOL_COUNT,
};
use filament_router::error::ConfigError;
use filament_router::{Millimeters, Steps};

fn clamped_fields(config: &mut RouterConfig) -> Vec<&'static str> {
    sanitize_config(config)
        .into_iter()
        .filter_map(|e| match e {
            ConfigError::OutOfRange { field, .. } => Some(field),
            _ => None,
        })
        .collect()
}

/// Test that the defaults need no clamping.
#[test]
fn test_defaults_are_in_range() {
    let mut config = RouterConfig::default();
    assert!(clamped_fields(&mut config).is_empty());
}

/// Test tool count limits.
#[test]
fn test_tool_count_limits() {
    for (count, expected) in [(1, DEFAULT_TOOL_COUNT), (2, 2), (12, 12), (13, DEFAULT_TOOL_COUNT)] {
        let mut config = RouterConfig {
            tool_count: count,
            ..RouterConfig::default()
        };
        sanitize_config(&mut config);
        assert_eq!(config.tool_count, expected, "tool_count = {}", count);
    }
}

/// Test that motor limits fall back to safe defaults.
#[test]
fn test_motor_limits() {
    let mut config = RouterConfig::default();
    config.feeder.motor.max_speed.0 = 0.0;
    config.revolver.motor.acceleration.0 = 100.0;
    config.selector.motor.acceleration.0 = 20_000.0;

    let fields = clamped_fields(&mut config);

    assert_eq!(
        fields,
        vec![
            "selector.motor.acceleration",
            "revolver.motor.acceleration",
            "feeder.motor.max_speed",
        ]
    );
    assert_eq!(config.feeder.motor.max_speed.0, DEFAULT_MAX_SPEED);
    assert_eq!(config.revolver.motor.acceleration.0, DEFAULT_ACCELERATION);
    assert_eq!(config.selector.motor.acceleration.0, DEFAULT_ACCELERATION);
}

/// Test that the range bounds themselves are accepted.
#[test]
fn test_bounds_are_inclusive() {
    let mut config = RouterConfig::default();
    config.selector.motor.max_speed.0 = 10_000.0;
    config.selector.motor.acceleration.0 = 200.0;
    config.feeder.motor.max_speed.0 = 1.0;
    config.feeder.motor.acceleration.0 = 15_000.0;
    config.feeder.pushback_delay_ms = 10_000;

    assert!(clamped_fields(&mut config).is_empty());
}

/// Test revolver geometry checks.
#[test]
fn test_revolver_geometry() {
    let mut config = RouterConfig::default();
    config.revolver.offset = Steps(9000);
    config.revolver.spacing = Some(Steps(0));

    let fields = clamped_fields(&mut config);

    assert!(fields.contains(&"revolver.offset"));
    assert!(fields.contains(&"revolver.spacing"));
    assert_eq!(config.revolver.offset, Steps(0));
    assert_eq!(config.revolver.effective_spacing(), Steps(864));
}

/// Test feeder lengths, delays and budgets.
#[test]
fn test_feeder_settings() {
    let mut config = RouterConfig::default();
    config.feeder.unload_retract = Millimeters(-5.0);
    config.feeder.pushback_delay_ms = 60_000;
    config.feeder.load_attempts = 0;
    config.feeder.unload_increment = Millimeters(0.0);

    let fields = clamped_fields(&mut config);

    assert_eq!(fields.len(), 4);
    assert_eq!(config.feeder.unload_retract.0, 0.0);
    assert_eq!(config.feeder.pushback_delay_ms, 0);
    assert_eq!(config.feeder.load_attempts, 100);
    assert_eq!(config.feeder.unload_increment.0, 20.0);
}

/// Test that parsing clamps rather than failing.
#[test]
fn test_parse_applies_clamping() {
    let config = parse_config(
        r#"
tool_count = 0

[selector]
steps_per_mm = -1.0
spacing = 20.0

[revolver]
steps_per_revolution = 0

[feeder]
steps_per_mm = 136.0
insert_speed = 99999.0
"#,
    )
    .expect("Out-of-range values are not parse errors");

    assert_eq!(config.tool_count, DEFAULT_TOOL_COUNT);
    assert_eq!(config.selector.steps_per_mm, 100.0);
    assert_eq!(config.revolver.steps_per_revolution, 8640);
    assert_eq!(config.feeder.insert_speed, None);
}
