//! Axis identity, interrupt-shared state and hardware drivers.

mod builder;
mod driver;
mod id;
mod shared;

pub use builder::PinAxisDriverBuilder;
pub use driver::{AxisDriver, NoPin, PinAxisDriver};
pub use id::{AxisId, AxisSelector};
pub use shared::AxisShared;
