//! Move plan calculation.
//!
//! Splits a move into acceleration, cruise and deceleration segments and
//! derives the step interval for every step from the acceleration limit.

use libm::sqrtf;

use crate::error::MotionError;

/// Direction of axis motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive step count.
    Forward,
    /// Negative step count.
    Reverse,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i32) -> Self {
        if steps >= 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Phase of a move at a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Accelerating from rest toward cruise rate.
    Accelerating,
    /// Moving at constant cruise rate.
    Cruising,
    /// Decelerating from cruise rate to rest.
    Decelerating,
    /// Motion complete.
    Complete,
}

/// Trapezoidal (or triangular) step schedule for one move.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    /// Total steps to move (absolute value).
    pub total_steps: u32,

    /// Direction of motion.
    pub direction: Direction,

    /// Steps in acceleration phase.
    pub accel_steps: u32,

    /// Steps in cruise phase.
    pub cruise_steps: u32,

    /// Steps in deceleration phase.
    pub decel_steps: u32,

    /// Highest step rate reached, in steps/sec.
    pub cruise_rate: f32,

    /// Acceleration rate in steps/sec².
    pub acceleration: f32,
}

impl MovePlan {
    /// Plan a move of `steps` signed steps.
    ///
    /// The ramp length is the distance needed to reach `max_speed` at
    /// `acceleration`. When two ramps do not fit, the plan is triangular: no
    /// cruise, half the steps accelerating and the other half (plus the odd
    /// step) decelerating, peaking at the rate reached after half the move.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a zero-length move, `InvalidParameters` when the
    /// speed or acceleration cannot be planned with.
    pub fn new(steps: i32, max_speed: f32, acceleration: f32) -> Result<Self, MotionError> {
        if steps == 0 {
            return Err(MotionError::InvalidRequest);
        }
        if !(max_speed > 0.0 && acceleration > 0.0 && max_speed.is_finite()) {
            return Err(MotionError::InvalidParameters {
                max_speed,
                acceleration,
            });
        }

        let direction = Direction::from_steps(steps);
        let total = steps.unsigned_abs();

        // Steps needed to reach max speed from rest: v² / 2a
        let ramp = (max_speed * max_speed / (2.0 * acceleration)) as u32;

        let plan = if 2 * ramp as u64 >= total as u64 {
            let accel_steps = total / 2;
            let peak = sqrtf(2.0 * acceleration * accel_steps.max(1) as f32);
            Self {
                total_steps: total,
                direction,
                accel_steps,
                cruise_steps: 0,
                decel_steps: total - accel_steps,
                cruise_rate: peak.min(max_speed),
                acceleration,
            }
        } else {
            Self {
                total_steps: total,
                direction,
                accel_steps: ramp,
                cruise_steps: total - 2 * ramp,
                decel_steps: ramp,
                cruise_rate: max_speed,
                acceleration,
            }
        };

        Ok(plan)
    }

    /// Whether the plan never reaches a cruise segment.
    #[inline]
    pub fn is_triangular(&self) -> bool {
        self.cruise_steps == 0
    }

    /// Get the phase of the step with index `step` (0-based).
    pub fn phase_at(&self, step: u32) -> MotionPhase {
        if step >= self.total_steps {
            MotionPhase::Complete
        } else if step < self.accel_steps {
            MotionPhase::Accelerating
        } else if step < self.accel_steps + self.cruise_steps {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Step rate for the step with index `step`, in steps/sec.
    ///
    /// Accelerating: `sqrt(2a(k+1))`. Decelerating with `r` steps left:
    /// `sqrt(2ar)`. Both capped at the cruise rate.
    pub fn rate_at(&self, step: u32) -> f32 {
        let rate = match self.phase_at(step) {
            MotionPhase::Complete => return 0.0,
            MotionPhase::Cruising => return self.cruise_rate,
            MotionPhase::Accelerating => sqrtf(2.0 * self.acceleration * (step + 1) as f32),
            MotionPhase::Decelerating => {
                let remaining = self.total_steps - step;
                sqrtf(2.0 * self.acceleration * remaining as f32)
            }
        };
        rate.min(self.cruise_rate)
    }

    /// Interval before the step with index `step`, in microseconds.
    pub fn interval_at(&self, step: u32) -> u32 {
        let rate = self.rate_at(step);
        if rate > 0.0 {
            ((1_000_000.0 / rate) as u32).max(1)
        } else {
            u32::MAX
        }
    }
}
