//! Motion façade.
//!
//! Turns logical requests ("move the feeder 50 mm") into scheduler moves on
//! the [`InterruptPump`] and blocks the control context until they finish.

use embedded_hal::delay::DelayNs;

use crate::axis::{AxisDriver, AxisId, AxisSelector, AxisShared};
use crate::config::units::{Steps, Unit};
use crate::config::{
    in_range, EndstopKind, MechanicalConstraints, RouterConfig, ACCELERATION_RANGE, SPEED_RANGE,
};
use crate::error::{ConfigError, MotionError, MotorError, Result};

use super::profile::MovePlan;
use super::pump::InterruptPump;

/// Interval between completion polls in microseconds.
pub const POLL_US: u32 = 100;

/// Control-context handle to the three axes.
///
/// Owns the per-axis constraints (tunable at runtime) and the delay provider
/// used while waiting. Never call into it from the interrupt context.
pub struct Motion<'p, D, DELAY>
where
    D: AxisDriver,
    DELAY: DelayNs,
{
    pump: &'p InterruptPump<D>,
    delay: DELAY,
    constraints: [MechanicalConstraints; 3],
}

impl<'p, D, DELAY> Motion<'p, D, DELAY>
where
    D: AxisDriver,
    DELAY: DelayNs,
{
    /// Create the façade and apply the configured endstops to the pump.
    pub fn new(pump: &'p InterruptPump<D>, delay: DELAY, config: &RouterConfig) -> Self {
        let constraints = AxisId::ALL.map(|axis| MechanicalConstraints::for_axis(config, axis));
        for c in constraints.iter() {
            pump.configure_endstop(c.axis, c.endstop, c.endstop_trigger);
        }

        Self {
            pump,
            delay,
            constraints,
        }
    }

    /// The pump this façade drives.
    #[inline]
    pub fn pump(&self) -> &'p InterruptPump<D> {
        self.pump
    }

    /// Constraints of an axis.
    #[inline]
    pub fn constraints(&self, axis: AxisId) -> &MechanicalConstraints {
        &self.constraints[axis.index()]
    }

    #[inline]
    fn shared(&self, axis: AxisId) -> &AxisShared {
        self.pump.shared(axis)
    }

    /// Block for `ms` milliseconds.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Position in steps.
    #[inline]
    pub fn position(&self, axis: AxisId) -> Steps {
        self.shared(axis).position()
    }

    /// Position in the axis' physical unit.
    pub fn position_units(&self, axis: AxisId) -> f32 {
        self.constraints(axis).to_units(self.position(axis))
    }

    /// Whether a move is running on `axis`.
    #[inline]
    pub fn is_moving(&self, axis: AxisId) -> bool {
        self.shared(axis).in_progress()
    }

    /// Whether `axis` is energized.
    #[inline]
    pub fn is_enabled(&self, axis: AxisId) -> bool {
        self.shared(axis).is_enabled()
    }

    /// Whether the last move on `axis` ended on its endstop.
    #[inline]
    pub fn stopped_on_endstop(&self, axis: AxisId) -> bool {
        self.shared(axis).stopped_on_endstop()
    }

    /// Sample the endstop of `axis` now.
    pub fn endstop_triggered(&self, axis: AxisId) -> Result<bool> {
        Ok(self.pump.endstop_triggered(axis)?)
    }

    // =========================================================================
    // Axis setup
    // =========================================================================

    /// Energize or release an axis.
    pub fn set_enabled(&mut self, axis: AxisId, enabled: bool) -> Result<()> {
        Ok(self.pump.set_enabled(axis, enabled)?)
    }

    /// Energize or release every axis.
    pub fn set_all_enabled(&mut self, enabled: bool) -> Result<()> {
        for axis in AxisId::ALL {
            self.set_enabled(axis, enabled)?;
        }
        Ok(())
    }

    /// Overwrite the position of an idle axis.
    pub fn set_position(&mut self, axis: AxisId, position: Steps) -> Result<()> {
        Ok(self.pump.set_position(axis, position)?)
    }

    /// Set an axis' max step rate.
    ///
    /// # Errors
    ///
    /// `RejectedValue` outside 1..=10000 steps/s.
    pub fn set_max_speed(&mut self, axis: AxisId, speed: f32) -> Result<()> {
        if !in_range(speed, SPEED_RANGE) {
            return Err(ConfigError::RejectedValue {
                field: "max_speed",
                value: speed,
            }
            .into());
        }
        self.constraints[axis.index()].max_speed = speed;
        Ok(())
    }

    /// Set an axis' acceleration.
    ///
    /// # Errors
    ///
    /// `RejectedValue` outside 200..=15000 steps/s².
    pub fn set_acceleration(&mut self, axis: AxisId, acceleration: f32) -> Result<()> {
        if !in_range(acceleration, ACCELERATION_RANGE) {
            return Err(ConfigError::RejectedValue {
                field: "acceleration",
                value: acceleration,
            }
            .into());
        }
        self.constraints[axis.index()].acceleration = acceleration;
        Ok(())
    }

    /// Force an endstop state in software (external feeder control), or
    /// hand it back to the input.
    pub fn set_endstop_override(&mut self, axis: AxisId, state: Option<bool>) {
        self.pump.set_endstop_override(axis, state);
    }

    /// Run `f` with moves on `axis` ending on endstop release.
    pub fn with_inverted_endstop<R>(
        &mut self,
        axis: AxisId,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.pump.set_endstop_inverted(axis, true);
        let result = f(self);
        self.pump.set_endstop_inverted(axis, false);
        result
    }

    /// Run `f` with `axis` limited to `speed` steps/s.
    pub fn at_speed<R>(
        &mut self,
        axis: AxisId,
        speed: f32,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let saved = self.replace_max_speed(axis, speed);
        let result = f(self);
        self.replace_max_speed(axis, saved);
        result
    }

    /// Swap an axis' max step rate without range checks, returning the
    /// previous one.
    pub(crate) fn replace_max_speed(&mut self, axis: AxisId, speed: f32) -> f32 {
        core::mem::replace(&mut self.constraints[axis.index()].max_speed, speed)
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Start a move of `delta` steps without waiting.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a zero-length move; `Busy`/`Disabled` from the
    /// axis state.
    pub fn prepare_relative(&mut self, axis: AxisId, delta: Steps, ignore_endstop: bool) -> Result<()> {
        let c = self.constraints(axis);
        let plan = MovePlan::new(delta.0, c.max_speed, c.acceleration)?;
        debug!(
            "{} move {} steps ({}/{}/{})",
            axis,
            delta.0,
            plan.accel_steps,
            plan.cruise_steps,
            plan.decel_steps
        );
        self.pump.begin_move(axis, plan, ignore_endstop)?;
        Ok(())
    }

    /// Start a move to `target` steps without waiting.
    pub fn prepare_absolute(&mut self, axis: AxisId, target: Steps, ignore_endstop: bool) -> Result<()> {
        let delta = target - self.position(axis);
        self.prepare_relative(axis, delta, ignore_endstop)
    }

    /// Start a relative move in `unit` without waiting.
    ///
    /// Millimeters and degrees are converted with the axis calibration,
    /// truncating toward zero.
    pub fn prepare_relative_in(
        &mut self,
        axis: AxisId,
        amount: f32,
        unit: Unit,
        ignore_endstop: bool,
    ) -> Result<()> {
        let delta = self.to_steps(axis, amount, unit)?;
        self.prepare_relative(axis, delta, ignore_endstop)
    }

    /// Start an absolute move in `unit` without waiting.
    pub fn prepare_absolute_in(
        &mut self,
        axis: AxisId,
        target: f32,
        unit: Unit,
        ignore_endstop: bool,
    ) -> Result<()> {
        let target = self.to_steps(axis, target, unit)?;
        self.prepare_absolute(axis, target, ignore_endstop)
    }

    /// Convert an amount in `unit` to steps for `axis`.
    pub fn to_steps(&self, axis: AxisId, amount: f32, unit: Unit) -> Result<Steps> {
        let c = self.constraints(axis);
        if !c.accepts(unit) {
            return Err(MotionError::UnitMismatch { axis, unit }.into());
        }
        Ok(match unit {
            Unit::Steps => Steps(amount as i32),
            _ => c.to_steps(amount),
        })
    }

    /// Block until every axis named by `axes` has finished its move.
    ///
    /// Polls every [`POLL_US`] microseconds; there is no timeout.
    ///
    /// # Errors
    ///
    /// `PinError` if a driver failed during one of the moves.
    pub fn run_and_wait(&mut self, axes: AxisSelector) -> Result<()> {
        loop {
            let pending = AxisId::ALL
                .iter()
                .any(|&axis| axes.includes(axis) && !self.shared(axis).is_done());
            if !pending {
                break;
            }
            self.delay.delay_us(POLL_US);
        }

        for axis in AxisId::ALL {
            if axes.includes(axis) && self.shared(axis).faulted() {
                error!("{} driver failure", axis);
                return Err(MotorError::PinError.into());
            }
        }
        Ok(())
    }

    /// Move `delta` steps and wait.
    pub fn move_relative(&mut self, axis: AxisId, delta: Steps, ignore_endstop: bool) -> Result<()> {
        self.prepare_relative(axis, delta, ignore_endstop)?;
        self.run_and_wait(AxisSelector::Axis(axis))
    }

    /// Move to `target` steps and wait. Already being there is not an error.
    pub fn move_to(&mut self, axis: AxisId, target: Steps, ignore_endstop: bool) -> Result<()> {
        if target == self.position(axis) {
            return Ok(());
        }
        self.prepare_absolute(axis, target, ignore_endstop)?;
        self.run_and_wait(AxisSelector::Axis(axis))
    }

    /// Move `amount` in `unit` and wait.
    pub fn move_relative_in(
        &mut self,
        axis: AxisId,
        amount: f32,
        unit: Unit,
        ignore_endstop: bool,
    ) -> Result<()> {
        self.prepare_relative_in(axis, amount, unit, ignore_endstop)?;
        self.run_and_wait(AxisSelector::Axis(axis))
    }

    /// Whether `axis` can be homed.
    #[inline]
    pub fn has_endstop(&self, axis: AxisId) -> bool {
        self.constraints(axis).endstop != EndstopKind::None
    }
}
