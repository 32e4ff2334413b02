//! Axis state shared between the control context and the interrupt pump.
//!
//! Every field is a word-sized atomic accessed only with plain loads and
//! stores, so the same code runs on cores without compare-and-swap.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

use crate::config::units::Steps;
use crate::motion::Direction;

const OVERRIDE_NONE: u8 = 0;
const OVERRIDE_RELEASED: u8 = 1;
const OVERRIDE_TRIGGERED: u8 = 2;

/// Interrupt-visible state of one axis.
///
/// `position` is written only by the interrupt pump while `in_progress` is
/// set, and only by the control context otherwise. The pump stores the final
/// position before publishing `done` with release ordering; readers that
/// observe `done` with acquire ordering therefore see the final position.
#[derive(Debug)]
pub struct AxisShared {
    position: AtomicI32,
    in_progress: AtomicBool,
    done: AtomicBool,
    fault: AtomicBool,
    stopped_on_endstop: AtomicBool,
    forward: AtomicBool,
    enabled: AtomicBool,
    endstop_triggered: AtomicBool,
    endstop_inverted: AtomicBool,
    endstop_override: AtomicU8,
}

impl AxisShared {
    /// Create an idle, disabled axis at position zero.
    pub const fn new() -> Self {
        Self {
            position: AtomicI32::new(0),
            in_progress: AtomicBool::new(false),
            done: AtomicBool::new(true),
            fault: AtomicBool::new(false),
            stopped_on_endstop: AtomicBool::new(false),
            forward: AtomicBool::new(true),
            enabled: AtomicBool::new(false),
            endstop_triggered: AtomicBool::new(false),
            endstop_inverted: AtomicBool::new(false),
            endstop_override: AtomicU8::new(OVERRIDE_NONE),
        }
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> Steps {
        Steps(self.position.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store_position(&self, steps: Steps) {
        self.position.store(steps.0, Ordering::Relaxed);
    }

    /// Advance the position by one step. Single writer, so load + store is
    /// enough.
    #[inline]
    pub(crate) fn step(&self, direction: Direction) {
        let next = self.position.load(Ordering::Relaxed).wrapping_add(direction.sign());
        self.position.store(next, Ordering::Relaxed);
    }

    /// Whether a move is running.
    #[inline]
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Whether the last move has completed.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Whether the last move was aborted by a driver failure.
    #[inline]
    pub fn faulted(&self) -> bool {
        self.fault.load(Ordering::Relaxed)
    }

    /// Whether the last move ended on its endstop.
    #[inline]
    pub fn stopped_on_endstop(&self) -> bool {
        self.stopped_on_endstop.load(Ordering::Relaxed)
    }

    /// Direction of the current or last move.
    #[inline]
    pub fn direction(&self) -> Direction {
        if self.forward.load(Ordering::Relaxed) {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Whether the axis is energized.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Endstop state as last sampled.
    #[inline]
    pub fn endstop_triggered(&self) -> bool {
        self.endstop_triggered.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_endstop(&self, triggered: bool) {
        self.endstop_triggered.store(triggered, Ordering::Relaxed);
    }

    /// Whether moves stop on endstop release instead of trigger.
    #[inline]
    pub fn endstop_inverted(&self) -> bool {
        self.endstop_inverted.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_endstop_inverted(&self, inverted: bool) {
        self.endstop_inverted.store(inverted, Ordering::Relaxed);
    }

    /// Software override of the endstop input, if any.
    #[inline]
    pub fn endstop_override(&self) -> Option<bool> {
        match self.endstop_override.load(Ordering::Relaxed) {
            OVERRIDE_RELEASED => Some(false),
            OVERRIDE_TRIGGERED => Some(true),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn set_endstop_override(&self, state: Option<bool>) {
        let raw = match state {
            None => OVERRIDE_NONE,
            Some(false) => OVERRIDE_RELEASED,
            Some(true) => OVERRIDE_TRIGGERED,
        };
        self.endstop_override.store(raw, Ordering::Relaxed);
    }

    /// Mark a move as started. Call only with the lane locked.
    pub(crate) fn start(&self, direction: Direction) {
        self.forward
            .store(direction == Direction::Forward, Ordering::Relaxed);
        self.fault.store(false, Ordering::Relaxed);
        self.stopped_on_endstop.store(false, Ordering::Relaxed);
        self.done.store(false, Ordering::Relaxed);
        self.in_progress.store(true, Ordering::Release);
    }

    /// Publish the end of a move. The position must already be stored.
    pub(crate) fn finish(&self, on_endstop: bool, fault: bool) {
        self.stopped_on_endstop.store(on_endstop, Ordering::Relaxed);
        self.fault.store(fault, Ordering::Relaxed);
        self.in_progress.store(false, Ordering::Relaxed);
        self.done.store(true, Ordering::Release);
    }
}

impl Default for AxisShared {
    fn default() -> Self {
        Self::new()
    }
}
