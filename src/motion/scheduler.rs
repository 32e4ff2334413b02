//! Per-axis step scheduling.
//!
//! A [`MoveScheduler`] walks a [`MovePlan`] one interrupt tick at a time. It
//! holds no hardware: the pump pulses the driver and updates the position
//! whenever a tick yields [`Tick::StepPulse`].

use super::profile::{Direction, MovePlan};

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// A step is due: pulse the driver and advance the position.
    StepPulse,
    /// Nothing due yet.
    Idle,
    /// The move has ended.
    Done(StopReason),
}

/// Why a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopReason {
    /// Every planned step was taken.
    Completed,
    /// The endstop stop condition was met before the next step.
    Endstop,
}

/// Runtime state of one move.
#[derive(Debug, Clone)]
pub struct MoveScheduler {
    /// The plan being executed.
    plan: MovePlan,

    /// Steps taken so far.
    step: u32,

    /// Interval before the next step in microseconds.
    interval_us: u32,

    /// Time accumulated toward the next step.
    elapsed_us: u32,

    /// Whether the endstop may end this move.
    stop_on_endstop: bool,
}

impl MoveScheduler {
    /// Create a scheduler for a plan.
    pub fn new(plan: MovePlan, stop_on_endstop: bool) -> Self {
        let interval_us = plan.interval_at(0);
        Self {
            plan,
            step: 0,
            interval_us,
            elapsed_us: 0,
            stop_on_endstop,
        }
    }

    /// Direction of the move.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.plan.direction
    }

    /// Steps still to take.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.plan.total_steps.saturating_sub(self.step)
    }

    /// Whether every planned step has been taken.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.step >= self.plan.total_steps
    }

    /// Advance by `elapsed_us` of interrupt time.
    ///
    /// `endstop_hit` is sampled only when a step is due on a move that stops
    /// on its endstop. A hit ends the move at once; the step is not taken.
    pub fn tick(&mut self, elapsed_us: u32, endstop_hit: impl FnOnce() -> bool) -> Tick {
        if self.is_complete() {
            return Tick::Done(StopReason::Completed);
        }

        self.elapsed_us = self.elapsed_us.saturating_add(elapsed_us);
        if self.elapsed_us < self.interval_us {
            return Tick::Idle;
        }

        if self.stop_on_endstop && endstop_hit() {
            return Tick::Done(StopReason::Endstop);
        }

        // Carry the overshoot, but never bank more than one step's worth.
        self.elapsed_us = (self.elapsed_us - self.interval_us).min(self.interval_us);
        self.step += 1;
        self.interval_us = self.plan.interval_at(self.step);

        Tick::StepPulse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(scheduler: &mut MoveScheduler, tick_us: u32, hit_after: Option<u32>) -> (u32, Tick) {
        let mut pulses = 0;
        loop {
            let hit = hit_after.map(|n| pulses >= n).unwrap_or(false);
            match scheduler.tick(tick_us, || hit) {
                Tick::StepPulse => {
                    pulses += 1;
                    if scheduler.is_complete() {
                        return (pulses, Tick::Done(StopReason::Completed));
                    }
                }
                Tick::Idle => {}
                done @ Tick::Done(_) => return (pulses, done),
            }
        }
    }

    #[test]
    fn test_runs_every_planned_step() {
        let plan = MovePlan::new(-300, 2000.0, 4000.0).unwrap();
        let mut scheduler = MoveScheduler::new(plan, false);

        let (pulses, outcome) = run(&mut scheduler, 20, None);

        assert_eq!(pulses, 300);
        assert_eq!(outcome, Tick::Done(StopReason::Completed));
        assert_eq!(scheduler.direction(), Direction::Reverse);
        assert_eq!(scheduler.tick(20, || false), Tick::Done(StopReason::Completed));
    }

    #[test]
    fn test_endstop_stops_early() {
        let plan = MovePlan::new(500, 2000.0, 4000.0).unwrap();
        let mut scheduler = MoveScheduler::new(plan, true);

        let (pulses, outcome) = run(&mut scheduler, 20, Some(42));

        assert_eq!(pulses, 42);
        assert_eq!(outcome, Tick::Done(StopReason::Endstop));
        assert_eq!(scheduler.steps_remaining(), 458);
    }

    #[test]
    fn test_unguarded_move_ignores_endstop() {
        let plan = MovePlan::new(50, 2000.0, 4000.0).unwrap();
        let mut scheduler = MoveScheduler::new(plan, false);

        let (pulses, _) = run(&mut scheduler, 20, Some(0));

        assert_eq!(pulses, 50);
    }

    #[test]
    fn test_first_step_waits_for_interval() {
        let plan = MovePlan::new(10, 1000.0, 2000.0).unwrap();
        let first = plan.interval_at(0);
        let mut scheduler = MoveScheduler::new(plan, false);

        assert_eq!(scheduler.tick(first - 1, || false), Tick::Idle);
        assert_eq!(scheduler.tick(1, || false), Tick::StepPulse);
        assert_eq!(scheduler.steps_remaining(), 9);
    }
}
