//! Homing.

use embedded_hal::delay::DelayNs;

use crate::axis::{AxisDriver, AxisId};
use crate::config::units::Steps;
use crate::config::EndstopKind;
use crate::error::{MotionError, Result};

use super::facade::Motion;
use super::profile::Direction;

impl<'p, D, DELAY> Motion<'p, D, DELAY>
where
    D: AxisDriver,
    DELAY: DelayNs,
{
    /// Drive `axis` onto its endstop at homing speed and zero its position.
    ///
    /// Min endstops are approached in reverse, max and orbital ones forward.
    /// An orbital axis resting on its endstop first rotates off it so the
    /// edge it homes against is always the same one.
    ///
    /// # Errors
    ///
    /// `NoEndstop` if the axis has none. `EndstopTimeout` if the travel bound
    /// runs out first; the axis stays enabled at an uncalibrated position.
    pub fn home(&mut self, axis: AxisId) -> Result<()> {
        let c = self.constraints(axis);
        let kind = c.endstop;
        let speed = c.homing_speed;
        let travel = c.homing_travel.min(i32::MAX as u32) as i32;

        if kind == EndstopKind::None {
            return Err(MotionError::NoEndstop(axis).into());
        }
        self.set_enabled(axis, true)?;

        let direction = match kind {
            EndstopKind::Min => Direction::Reverse,
            _ => Direction::Forward,
        };
        let timeout = MotionError::EndstopTimeout { axis, travel };

        if travel == 0 {
            if self.endstop_triggered(axis)? {
                self.set_position(axis, Steps(0))?;
                return Ok(());
            }
            return Err(timeout.into());
        }
        let bounded = Steps(travel * direction.sign());

        self.at_speed(axis, speed, |motion| {
            if kind == EndstopKind::Orbital && motion.endstop_triggered(axis)? {
                motion.with_inverted_endstop(axis, |motion| {
                    motion.move_relative(axis, bounded, false)
                })?;
                if motion.endstop_triggered(axis)? {
                    warn!("{} could not leave its endstop", axis);
                    return Err(timeout.clone().into());
                }
            }

            motion.move_relative(axis, bounded, false)?;
            if !motion.stopped_on_endstop(axis) && !motion.endstop_triggered(axis)? {
                warn!("{} endstop not reached within {} steps", axis, travel);
                return Err(timeout.clone().into());
            }

            motion.set_position(axis, Steps(0))?;
            info!("{} homed", axis);
            Ok(())
        })
    }
}
