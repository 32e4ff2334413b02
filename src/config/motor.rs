//! Per-axis motor configuration from TOML.

use core::fmt;

use serde::Deserialize;

use crate::motion::Direction;

use super::units::{StepsPerSec, StepsPerSecSquared};

/// Where an axis' endstop sits relative to its travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum EndstopKind {
    /// No endstop fitted.
    None,
    /// Endstop at position 0, reached moving in reverse.
    Min,
    /// Endstop at the far end, reached moving forward.
    Max,
    /// Endstop on a rotating axis, reached by rotation.
    Orbital,
}

impl EndstopKind {
    /// Whether a move in `direction` is ended by this endstop.
    ///
    /// Linear endstops only end moves that approach them; with `inverted`
    /// polarity (stop on release) only moves that leave them. An orbital
    /// endstop ends moves in either direction.
    pub fn stops(self, direction: Direction, inverted: bool) -> bool {
        match self {
            EndstopKind::None => false,
            EndstopKind::Orbital => true,
            EndstopKind::Min => (direction == Direction::Reverse) != inverted,
            EndstopKind::Max => (direction == Direction::Forward) != inverted,
        }
    }
}

impl fmt::Display for EndstopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndstopKind::None => write!(f, "none"),
            EndstopKind::Min => write!(f, "min"),
            EndstopKind::Max => write!(f, "max"),
            EndstopKind::Orbital => write!(f, "orbital"),
        }
    }
}

/// Electrical level at which an endstop counts as triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum TriggerLevel {
    /// Triggered when the input reads high.
    #[default]
    High,
    /// Triggered when the input reads low.
    Low,
}

impl TriggerLevel {
    /// Check whether a raw pin level means "triggered".
    #[inline]
    pub fn is_triggered(self, level_high: bool) -> bool {
        match self {
            TriggerLevel::High => level_high,
            TriggerLevel::Low => !level_high,
        }
    }
}

/// Drive parameters shared by all three axes.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Maximum step rate.
    #[serde(default = "default_max_speed")]
    pub max_speed: StepsPerSec,

    /// Acceleration and deceleration rate.
    #[serde(default = "default_acceleration")]
    pub acceleration: StepsPerSecSquared,

    /// Step rate used while homing (defaults to half of `max_speed`).
    #[serde(default)]
    pub homing_speed: Option<StepsPerSec>,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Endstop placement (each axis has its own default).
    #[serde(default)]
    pub endstop: Option<EndstopKind>,

    /// Endstop trigger level.
    #[serde(default)]
    pub endstop_trigger: TriggerLevel,

    /// Maximum homing travel in axis units (mm or degrees).
    #[serde(default)]
    pub homing_travel: Option<f32>,
}

impl MotorConfig {
    /// Effective homing speed.
    pub fn effective_homing_speed(&self) -> StepsPerSec {
        self.homing_speed
            .unwrap_or(StepsPerSec(self.max_speed.0 * 0.5))
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            max_speed: StepsPerSec(DEFAULT_MAX_SPEED),
            acceleration: StepsPerSecSquared(DEFAULT_ACCELERATION),
            homing_speed: None,
            invert_direction: false,
            endstop: None,
            endstop_trigger: TriggerLevel::High,
            homing_travel: None,
        }
    }
}

/// Default max step rate when none (or an invalid one) is configured.
pub const DEFAULT_MAX_SPEED: f32 = 1000.0;

/// Default acceleration when none (or an invalid one) is configured.
pub const DEFAULT_ACCELERATION: f32 = 1000.0;

fn default_max_speed() -> StepsPerSec {
    StepsPerSec(DEFAULT_MAX_SPEED)
}

fn default_acceleration() -> StepsPerSecSquared {
    StepsPerSecSquared(DEFAULT_ACCELERATION)
}
