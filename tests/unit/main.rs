//! Unit test harness for filament-router.
//!
//! This module organizes unit tests for each component of the library.

mod config_clamping;
mod config_parsing;
mod pin_driver;
mod profile_properties;
