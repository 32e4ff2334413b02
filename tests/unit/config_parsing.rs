//! Unit tests for configuration parsing.

use filament_router::config::{
    parse_config, EndstopKind, MechanicalConstraints, TriggerLevel, UnloadPolicy, Unit,
};
use filament_router::error::{ConfigError, Error};
use filament_router::{AxisId, Steps};

const MINIMAL_CONFIG: &str = r#"
[selector]
steps_per_mm = 100.0
spacing = 20.0

[revolver]
steps_per_revolution = 8640

[feeder]
steps_per_mm = 136.0
"#;

const FULL_CONFIG: &str = r#"
tool_count = 8
bowden_length = 620.0
external_control = true
unload_policy = "auto"
offer_load_after_select = true

[selector]
steps_per_mm = 80.0
offset = 4.5
spacing = 21.0

[selector.motor]
max_speed = 4000.0
acceleration = 3000.0
homing_speed = 1500.0
invert_direction = true
endstop_trigger = "low"
homing_travel = 200.0

[revolver]
steps_per_revolution = 6400
offset = 120
spacing = 800
reset_before_feed = true
home_after_feed = true

[revolver.motor]
endstop = "orbital"

[feeder]
steps_per_mm = 140.0
insert_speed = 300.0
reinforce_length = 3.0
unload_retract = 10.0
unload_pushback = 5.0
pushback_delay_ms = 250
load_attempts = 60
unload_attempts = 150
load_increment = 2.0
unload_increment = 15.0
jam_relief = 12.0

[feeder.motor]
max_speed = 2500.0
endstop = "none"
"#;

/// Test parsing a configuration that relies on defaults.
#[test]
fn test_parse_minimal_config() {
    let config = parse_config(MINIMAL_CONFIG).expect("Should parse minimal config");

    assert_eq!(config.tool_count, 5);
    assert_eq!(config.bowden_length.0, 0.0);
    assert!(!config.external_control);
    assert_eq!(config.unload_policy, UnloadPolicy::Ask);
    assert_eq!(config.selector.offset.0, 0.0);
    assert_eq!(config.revolver.effective_spacing(), Steps(864));
    assert_eq!(config.feeder.load_attempts, 100);
    assert_eq!(config.feeder.unload_attempts, 200);
    assert_eq!(config.feeder.load_increment.0, 2.5);
    assert_eq!(config.feeder.unload_increment.0, 20.0);
    assert_eq!(config.feeder.jam_relief.0, 15.0);
    assert_eq!(
        config.feeder.effective_insert_speed(),
        config.feeder.motor.max_speed
    );
}

/// Test parsing every supported field.
#[test]
fn test_parse_full_config() {
    let config = parse_config(FULL_CONFIG).expect("Should parse full config");

    assert_eq!(config.tool_count, 8);
    assert!(config.external_control);
    assert!(config.offer_load_after_select);
    assert_eq!(config.unload_policy, UnloadPolicy::Auto);

    let selector = &config.selector.motor;
    assert!(selector.invert_direction);
    assert_eq!(selector.endstop_trigger, TriggerLevel::Low);
    assert_eq!(selector.effective_homing_speed().0, 1500.0);

    assert_eq!(config.revolver.offset, Steps(120));
    assert_eq!(config.revolver.effective_spacing(), Steps(800));
    assert!(config.revolver.reset_before_feed);
    assert!(config.revolver.home_after_feed);
    assert_eq!(config.revolver.motor.endstop, Some(EndstopKind::Orbital));

    assert_eq!(config.feeder.effective_insert_speed().0, 300.0);
    assert_eq!(config.feeder.pushback_delay_ms, 250);
    assert_eq!(config.feeder.motor.endstop, Some(EndstopKind::None));
}

/// Test per-axis constraints derived from a parsed configuration.
#[test]
fn test_derived_axis_constraints() {
    let config = parse_config(FULL_CONFIG).expect("Should parse full config");

    let selector = MechanicalConstraints::for_axis(&config, AxisId::Selector);
    assert_eq!(selector.unit, Unit::Millimeters);
    assert_eq!(selector.endstop, EndstopKind::Min);
    assert_eq!(selector.homing_travel, 16_000);
    assert!(selector.invert_direction);

    let revolver = MechanicalConstraints::for_axis(&config, AxisId::Revolver);
    assert_eq!(revolver.unit, Unit::Degrees);
    assert_eq!(revolver.steps_per_revolution, Some(6400));
    assert_eq!(revolver.to_steps(90.0), Steps(1600));

    let feeder = MechanicalConstraints::for_axis(&config, AxisId::Feeder);
    assert_eq!(feeder.endstop, EndstopKind::None);
    assert_eq!(feeder.max_speed, 2500.0);
    assert_eq!(feeder.homing_speed, 1250.0);
}

/// Test that channel positions follow offset and spacing.
#[test]
fn test_channel_positions() {
    let config = parse_config(FULL_CONFIG).expect("Should parse full config");

    assert_eq!(config.selector_position(0).0, 4.5);
    assert_eq!(config.selector_position(2).0, 46.5);
    assert_eq!(config.revolver_position(3), Steps(120 + 3 * 800));
}

/// Test that a missing required field fails to parse.
#[test]
fn test_missing_required_field() {
    let result = parse_config(
        r#"
[selector]
steps_per_mm = 100.0

[revolver]
steps_per_revolution = 8640

[feeder]
steps_per_mm = 136.0
"#,
    );

    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test that an unknown endstop kind is rejected.
#[test]
fn test_unknown_endstop_kind() {
    let toml_str = MINIMAL_CONFIG.replace(
        "[feeder]\nsteps_per_mm = 136.0\n",
        "[feeder]\nsteps_per_mm = 136.0\n\n[feeder.motor]\nendstop = \"sideways\"\n",
    );

    assert!(parse_config(&toml_str).is_err());
}
