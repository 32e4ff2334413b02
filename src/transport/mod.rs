//! Filament transport for filament-router.
//!
//! Channel selection, loading and unloading on top of the motion façade,
//! with a sticky jam state and bounded retries.

mod retry;
mod router;
mod state;

pub use retry::{Attempt, Attempts, Backoff, RetryPolicy};
pub use router::Router;
pub use state::{Activity, AxisStatus, RouterSnapshot, TransportState, TransportStatus};
