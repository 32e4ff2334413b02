//! Motion module for filament-router.
//!
//! Provides move planning, per-tick step scheduling, the interrupt pump that
//! drives it, and the blocking façade used by the control context.

mod facade;
mod homing;
mod profile;
mod pump;
mod scheduler;

pub use facade::{Motion, POLL_US};
pub use profile::{Direction, MotionPhase, MovePlan};
pub use pump::{InterruptPump, DEFAULT_TICK_US};
pub use scheduler::{MoveScheduler, StopReason, Tick};
