//! # filament-router
//!
//! Motion core for a motorized multi-channel filament router: a selector that
//! travels between channels, a revolver that clamps the active channel's
//! filament, and a feeder that pushes it to the printer.
//!
//! ## Features
//!
//! - **Interrupt-driven stepping**: one fixed-rate pump pulses all three axes
//! - **Trapezoidal profiles**: triangular fallback for short moves
//! - **Endstop homing**: bounded travel, reported failures
//! - **Filament transport**: select, load and unload with bounded retries and
//!   a sticky jam state
//! - **Persistence**: positions and selection survive a power cycle
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use filament_router::{InterruptPump, PositionStore, Router, Unattended};
//!
//! // Load and clamp configuration
//! let config = filament_router::load_config("router.toml")?;
//!
//! // One driver per axis; the pump is called from a timer interrupt
//! static PUMP: InterruptPump<MyDriver> = /* ... */;
//!
//! let mut router = Router::new(
//!     &PUMP,
//!     delay,
//!     config,
//!     PositionStore::new(eeprom),
//!     Unattended { answer: true },
//! )?;
//!
//! router.home_all()?;
//! router.select_channel(2)?;
//! router.load_filament()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O, TOML parsing and a host
//!   critical-section implementation
//! - `defmt`: Enables defmt logging for embedded targets
//! - `tracing`: Enables tracing logging for host builds

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Core modules
pub mod axis;
pub mod config;
pub mod error;
pub mod io;
pub mod motion;
pub mod persist;
pub mod transport;

// Re-exports for ergonomic API
pub use axis::{AxisDriver, AxisId, AxisSelector, PinAxisDriver};
pub use config::{sanitize_config, MotorConfig, RouterConfig};
pub use error::{Error, Result};
pub use io::{Feedback, FeedbackSink, Notice, Prompt, Signal, SignalChannel, Unattended};
pub use motion::{Direction, InterruptPump, Motion, MovePlan};
pub use persist::{MemoryStorage, PositionStore};
pub use transport::{RetryPolicy, Router, TransportState};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Degrees, Millimeters, Steps, Unit};
