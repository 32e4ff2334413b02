//! Configuration module for filament-router.
//!
//! Provides the TOML schema for the three axes and the transport settings,
//! clamping of out-of-range values, and the derived per-axis constraints used
//! for motion planning.

mod mechanical;
mod motor;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use mechanical::MechanicalConstraints;
pub use motor::{EndstopKind, MotorConfig, TriggerLevel, DEFAULT_ACCELERATION, DEFAULT_MAX_SPEED};
pub use system::{
    FeederConfig, RevolverConfig, RouterConfig, SelectorConfig, UnloadPolicy, DEFAULT_TOOL_COUNT,
    MAX_TOOLS, MIN_TOOLS,
};
pub use validation::{
    in_range, sanitize_config, ClampReport, ACCELERATION_RANGE, MAX_PUSHBACK_DELAY_MS,
    SPEED_RANGE,
};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Degrees, Millimeters, Steps, StepsPerSec, StepsPerSecSquared, Unit};
