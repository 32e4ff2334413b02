//! Mechanical constraints derived from axis configuration.

use crate::axis::AxisId;

use super::motor::{EndstopKind, MotorConfig, TriggerLevel};
use super::system::RouterConfig;
use super::units::{Steps, Unit};

/// Derived per-axis parameters used for all motion planning.
///
/// Computed once at startup from [`RouterConfig`]; speed and acceleration may
/// later be retuned at runtime.
#[derive(Debug, Clone)]
pub struct MechanicalConstraints {
    /// Axis these constraints belong to.
    pub axis: AxisId,

    /// Physical unit of the axis (millimeters or degrees).
    pub unit: Unit,

    /// Steps per physical unit.
    pub steps_per_unit: f32,

    /// Maximum step rate in steps per second.
    pub max_speed: f32,

    /// Acceleration in steps per second squared.
    pub acceleration: f32,

    /// Step rate while homing.
    pub homing_speed: f32,

    /// Endstop placement.
    pub endstop: EndstopKind,

    /// Endstop trigger level.
    pub endstop_trigger: TriggerLevel,

    /// Whether direction pin logic is inverted.
    pub invert_direction: bool,

    /// Homing travel bound in steps.
    pub homing_travel: u32,
}

impl MechanicalConstraints {
    /// Compute constraints for one axis of a router configuration.
    pub fn for_axis(config: &RouterConfig, axis: AxisId) -> Self {
        match axis {
            AxisId::Selector => {
                let spm = config.selector.steps_per_mm;
                // Full channel span plus margin.
                let span = config.selector_span().0 * 1.1;
                Self::from_motor(
                    axis,
                    &config.selector.motor,
                    Unit::Millimeters,
                    spm,
                    EndstopKind::Min,
                    span,
                )
            }
            AxisId::Revolver => {
                let revolution = config.revolver.steps_per_revolution;
                Self::from_motor(
                    axis,
                    &config.revolver.motor,
                    Unit::Degrees,
                    revolution as f32 / 360.0,
                    EndstopKind::Orbital,
                    360.0 * 1.1,
                )
            }
            AxisId::Feeder => Self::from_motor(
                axis,
                &config.feeder.motor,
                Unit::Millimeters,
                config.feeder.steps_per_mm,
                EndstopKind::Max,
                config.bowden_length.0,
            ),
        }
    }

    fn from_motor(
        axis: AxisId,
        motor: &MotorConfig,
        unit: Unit,
        steps_per_unit: f32,
        default_endstop: EndstopKind,
        default_travel: f32,
    ) -> Self {
        let travel_units = motor.homing_travel.unwrap_or(default_travel);
        let homing_travel = (travel_units * steps_per_unit).max(0.0) as u32;

        Self {
            axis,
            unit,
            steps_per_unit,
            max_speed: motor.max_speed.0,
            acceleration: motor.acceleration.0,
            homing_speed: motor.effective_homing_speed().0,
            endstop: motor.endstop.unwrap_or(default_endstop),
            endstop_trigger: motor.endstop_trigger,
            invert_direction: motor.invert_direction,
            homing_travel,
        }
    }

    /// Convert a physical amount to steps, truncating toward zero.
    #[inline]
    pub fn to_steps(&self, amount: f32) -> Steps {
        Steps::from_units(amount, self.steps_per_unit)
    }

    /// Convert steps to a physical amount.
    #[inline]
    pub fn to_units(&self, steps: Steps) -> f32 {
        steps.to_units(self.steps_per_unit)
    }

    /// Whether `unit` can be used to address this axis.
    #[inline]
    pub fn accepts(&self, unit: Unit) -> bool {
        unit == Unit::Steps || unit == self.unit
    }
}
