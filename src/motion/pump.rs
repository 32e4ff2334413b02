//! Interrupt pump.
//!
//! [`InterruptPump::on_tick`] is meant to be called from a fixed-rate timer
//! interrupt. Each call advances every axis with a move in progress by one
//! tick period; any axis whose next step is due gets pulsed, so a single tick
//! may pulse zero to three axes.
//!
//! Move schedulers and drivers live behind a critical-section mutex. The
//! per-axis flags and positions the control context polls are atomics in
//! [`AxisShared`].

use core::cell::RefCell;

use critical_section::Mutex;

use crate::axis::{AxisDriver, AxisId, AxisShared};
use crate::config::units::Steps;
use crate::config::{EndstopKind, TriggerLevel};
use crate::error::MotorError;

use super::profile::MovePlan;
use super::scheduler::{MoveScheduler, StopReason, Tick};

/// Default timer period in microseconds.
pub const DEFAULT_TICK_US: u32 = 20;

struct Lane<D> {
    driver: D,
    active: Option<MoveScheduler>,
    endstop: EndstopKind,
    trigger: TriggerLevel,
}

impl<D: AxisDriver> Lane<D> {
    fn new(driver: D) -> Self {
        Self {
            driver,
            active: None,
            endstop: EndstopKind::None,
            trigger: TriggerLevel::High,
        }
    }

    fn advance(&mut self, elapsed_us: u32, shared: &AxisShared) {
        let Lane {
            driver,
            active,
            trigger,
            ..
        } = self;
        let Some(scheduler) = active.as_mut() else {
            return;
        };

        let mut read_fault = false;
        let tick = scheduler.tick(elapsed_us, || match sample(&mut *driver, *trigger, shared) {
            Ok(triggered) => triggered != shared.endstop_inverted(),
            Err(_) => {
                read_fault = true;
                true
            }
        });
        let direction = scheduler.direction();
        let complete = scheduler.is_complete();

        match tick {
            Tick::Idle => {}
            Tick::StepPulse => {
                if driver.pulse().is_err() {
                    *active = None;
                    shared.finish(false, true);
                    return;
                }
                shared.step(direction);
                if complete {
                    *active = None;
                    shared.finish(false, false);
                }
            }
            Tick::Done(reason) => {
                *active = None;
                shared.finish(reason == StopReason::Endstop && !read_fault, read_fault);
            }
        }
    }
}

/// Read the endstop (or its software override) and record the result.
fn sample<D: AxisDriver>(
    driver: &mut D,
    trigger: TriggerLevel,
    shared: &AxisShared,
) -> Result<bool, MotorError> {
    let triggered = match shared.endstop_override() {
        Some(state) => state,
        None => trigger.is_triggered(driver.read_endstop()?),
    };
    shared.record_endstop(triggered);
    Ok(triggered)
}

/// Fixed-rate pulse generator for the three axes.
pub struct InterruptPump<D> {
    shared: [AxisShared; 3],
    lanes: Mutex<RefCell<[Lane<D>; 3]>>,
    tick_us: u32,
}

impl<D: AxisDriver> InterruptPump<D> {
    /// Create a pump over the three axis drivers.
    ///
    /// Endstops start unconfigured; [`Motion::new`](super::Motion::new)
    /// applies the configured kinds and trigger levels.
    pub fn new(selector: D, revolver: D, feeder: D) -> Self {
        Self {
            shared: [AxisShared::new(), AxisShared::new(), AxisShared::new()],
            lanes: Mutex::new(RefCell::new([
                Lane::new(selector),
                Lane::new(revolver),
                Lane::new(feeder),
            ])),
            tick_us: DEFAULT_TICK_US,
        }
    }

    /// Set the timer period the pump is called at.
    pub fn with_tick_period(mut self, tick_us: u32) -> Self {
        self.tick_us = tick_us.max(1);
        self
    }

    /// Timer period in microseconds.
    #[inline]
    pub fn tick_period_us(&self) -> u32 {
        self.tick_us
    }

    /// Interrupt-visible state of an axis.
    #[inline]
    pub fn shared(&self, axis: AxisId) -> &AxisShared {
        &self.shared[axis.index()]
    }

    /// Timer interrupt entry point.
    pub fn on_tick(&self) {
        critical_section::with(|cs| {
            let mut lanes = self.lanes.borrow_ref_mut(cs);
            for (lane, shared) in lanes.iter_mut().zip(self.shared.iter()) {
                lane.advance(self.tick_us, shared);
            }
        });
    }

    /// Start a move on an idle, enabled axis.
    ///
    /// Unless `ignore_endstop` is set, the move ends early when the axis'
    /// endstop condition is met while moving in a direction it guards.
    pub fn begin_move(
        &self,
        axis: AxisId,
        plan: MovePlan,
        ignore_endstop: bool,
    ) -> Result<(), MotorError> {
        let shared = self.shared(axis);

        critical_section::with(|cs| {
            if shared.in_progress() {
                return Err(MotorError::Busy(axis));
            }
            if !shared.is_enabled() {
                return Err(MotorError::Disabled(axis));
            }

            let mut lanes = self.lanes.borrow_ref_mut(cs);
            let lane = &mut lanes[axis.index()];
            let direction = plan.direction;

            lane.driver.set_direction(direction)?;

            let guarded =
                !ignore_endstop && lane.endstop.stops(direction, shared.endstop_inverted());
            lane.active = Some(MoveScheduler::new(plan, guarded));
            shared.start(direction);
            Ok(())
        })
    }

    /// Configure an axis' endstop.
    pub fn configure_endstop(&self, axis: AxisId, kind: EndstopKind, trigger: TriggerLevel) {
        self.with_lane(axis, |lane| {
            lane.endstop = kind;
            lane.trigger = trigger;
        });
    }

    /// Energize or release an axis. Refused while it moves.
    pub fn set_enabled(&self, axis: AxisId, enabled: bool) -> Result<(), MotorError> {
        let shared = self.shared(axis);
        critical_section::with(|cs| {
            if shared.in_progress() {
                return Err(MotorError::Busy(axis));
            }
            self.lanes.borrow_ref_mut(cs)[axis.index()]
                .driver
                .set_enabled(enabled)?;
            shared.set_enabled(enabled);
            Ok(())
        })
    }

    /// Overwrite an axis' position. Refused while it moves.
    pub fn set_position(&self, axis: AxisId, position: Steps) -> Result<(), MotorError> {
        let shared = self.shared(axis);
        critical_section::with(|_| {
            if shared.in_progress() {
                return Err(MotorError::Busy(axis));
            }
            shared.store_position(position);
            Ok(())
        })
    }

    /// Sample the endstop now.
    pub fn endstop_triggered(&self, axis: AxisId) -> Result<bool, MotorError> {
        let shared = self.shared(axis);
        self.with_lane(axis, |lane| sample(&mut lane.driver, lane.trigger, shared))
    }

    /// Stop moves on endstop release instead of trigger.
    ///
    /// Takes effect for moves started afterwards.
    pub fn set_endstop_inverted(&self, axis: AxisId, inverted: bool) {
        self.shared(axis).set_endstop_inverted(inverted);
    }

    /// Force the endstop state in software, or hand it back to the input.
    pub fn set_endstop_override(&self, axis: AxisId, state: Option<bool>) {
        self.shared(axis).set_endstop_override(state);
    }

    /// Run `f` with exclusive access to an axis driver.
    pub fn with_driver<R>(&self, axis: AxisId, f: impl FnOnce(&mut D) -> R) -> R {
        self.with_lane(axis, |lane| f(&mut lane.driver))
    }

    fn with_lane<R>(&self, axis: AxisId, f: impl FnOnce(&mut Lane<D>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.lanes.borrow_ref_mut(cs)[axis.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Direction;

    #[derive(Default)]
    struct CountingDriver {
        pulses: u32,
        level: bool,
        direction: Option<Direction>,
    }

    impl AxisDriver for CountingDriver {
        fn pulse(&mut self) -> Result<(), MotorError> {
            self.pulses += 1;
            Ok(())
        }

        fn read_endstop(&mut self) -> Result<bool, MotorError> {
            Ok(self.level)
        }

        fn set_enabled(&mut self, _enabled: bool) -> Result<(), MotorError> {
            Ok(())
        }

        fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
            self.direction = Some(direction);
            Ok(())
        }
    }

    fn pump() -> InterruptPump<CountingDriver> {
        let pump = InterruptPump::new(
            CountingDriver::default(),
            CountingDriver::default(),
            CountingDriver::default(),
        )
        .with_tick_period(50);
        for axis in AxisId::ALL {
            pump.set_enabled(axis, true).unwrap();
        }
        pump
    }

    fn drain(pump: &InterruptPump<CountingDriver>) {
        while AxisId::ALL.iter().any(|&axis| pump.shared(axis).in_progress()) {
            pump.on_tick();
        }
    }

    #[test]
    fn test_move_updates_position_and_pulses() {
        let pump = pump();
        let plan = MovePlan::new(-120, 4000.0, 8000.0).unwrap();

        pump.begin_move(AxisId::Feeder, plan, false).unwrap();
        drain(&pump);

        let shared = pump.shared(AxisId::Feeder);
        assert!(shared.is_done());
        assert_eq!(shared.position(), Steps(-120));
        assert_eq!(pump.with_driver(AxisId::Feeder, |d| d.pulses), 120);
        assert_eq!(
            pump.with_driver(AxisId::Feeder, |d| d.direction),
            Some(Direction::Reverse)
        );
    }

    #[test]
    fn test_axes_advance_independently() {
        let pump = pump();
        pump.begin_move(AxisId::Selector, MovePlan::new(200, 4000.0, 8000.0).unwrap(), false)
            .unwrap();
        pump.begin_move(AxisId::Revolver, MovePlan::new(30, 4000.0, 8000.0).unwrap(), false)
            .unwrap();
        drain(&pump);

        assert_eq!(pump.shared(AxisId::Selector).position(), Steps(200));
        assert_eq!(pump.shared(AxisId::Revolver).position(), Steps(30));
        assert_eq!(pump.shared(AxisId::Feeder).position(), Steps(0));
    }

    #[test]
    fn test_busy_and_disabled_are_refused() {
        let pump = pump();
        let plan = MovePlan::new(500, 1000.0, 1000.0).unwrap();
        pump.begin_move(AxisId::Selector, plan.clone(), false).unwrap();

        assert_eq!(
            pump.begin_move(AxisId::Selector, plan.clone(), false),
            Err(MotorError::Busy(AxisId::Selector))
        );
        assert_eq!(
            pump.set_position(AxisId::Selector, Steps(0)),
            Err(MotorError::Busy(AxisId::Selector))
        );

        pump.set_enabled(AxisId::Feeder, false).unwrap();
        assert_eq!(
            pump.begin_move(AxisId::Feeder, plan, false),
            Err(MotorError::Disabled(AxisId::Feeder))
        );
    }

    #[test]
    fn test_guarded_move_stops_on_endstop() {
        let pump = pump();
        pump.configure_endstop(AxisId::Selector, EndstopKind::Min, TriggerLevel::High);
        pump.with_driver(AxisId::Selector, |d| d.level = true);

        pump.begin_move(AxisId::Selector, MovePlan::new(-100, 4000.0, 8000.0).unwrap(), false)
            .unwrap();
        drain(&pump);

        let shared = pump.shared(AxisId::Selector);
        assert!(shared.stopped_on_endstop());
        assert_eq!(shared.position(), Steps(0));
    }

    #[test]
    fn test_move_away_from_endstop_is_not_guarded() {
        let pump = pump();
        pump.configure_endstop(AxisId::Selector, EndstopKind::Min, TriggerLevel::High);
        pump.with_driver(AxisId::Selector, |d| d.level = true);

        pump.begin_move(AxisId::Selector, MovePlan::new(100, 4000.0, 8000.0).unwrap(), false)
            .unwrap();
        drain(&pump);

        assert_eq!(pump.shared(AxisId::Selector).position(), Steps(100));
    }

    #[test]
    fn test_override_and_inversion() {
        let pump = pump();
        pump.configure_endstop(AxisId::Feeder, EndstopKind::Max, TriggerLevel::Low);

        // Low trigger level: a low input reads as triggered.
        assert_eq!(pump.endstop_triggered(AxisId::Feeder), Ok(true));

        pump.set_endstop_override(AxisId::Feeder, Some(false));
        assert_eq!(pump.endstop_triggered(AxisId::Feeder), Ok(false));

        // Inverted: reverse moves stop once released.
        pump.set_endstop_inverted(AxisId::Feeder, true);
        pump.begin_move(AxisId::Feeder, MovePlan::new(-100, 4000.0, 8000.0).unwrap(), false)
            .unwrap();
        drain(&pump);

        assert!(pump.shared(AxisId::Feeder).stopped_on_endstop());
        assert_eq!(pump.shared(AxisId::Feeder).position(), Steps(0));
    }
}
