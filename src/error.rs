//! Error types for filament-router.
//!
//! Provides unified error handling across configuration, axis hardware,
//! motion scheduling, filament transport and position persistence.

use core::fmt;

use crate::axis::AxisId;
use crate::config::units::Unit;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all filament-router operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or range error
    Config(ConfigError),
    /// Axis hardware or axis state error
    Motor(MotorError),
    /// Motion request or homing error
    Motion(MotionError),
    /// Filament transport error
    Transport(TransportError),
    /// Non-volatile storage error
    Storage(StorageError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// A value was outside its documented range and was replaced
    OutOfRange {
        /// Dotted name of the offending field
        field: &'static str,
        /// Value found in the configuration
        value: f32,
        /// Safe default that replaced it
        replaced_with: f32,
    },
    /// A runtime tuning request was outside its documented range
    RejectedValue {
        /// Parameter name
        field: &'static str,
        /// Requested value
        value: f32,
    },
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Axis hardware and axis state errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// A move is already in progress on this axis
    Busy(AxisId),
    /// The axis must be enabled before it can move
    Disabled(AxisId),
}

/// Motion request and homing errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Zero-length or otherwise meaningless move
    InvalidRequest,
    /// Unit does not apply to this axis (e.g. millimeters on the revolver)
    UnitMismatch {
        /// Axis the request targeted
        axis: AxisId,
        /// Unit that was requested
        unit: Unit,
    },
    /// Speed or acceleration is not usable for planning
    InvalidParameters {
        /// Requested max step rate
        max_speed: f32,
        /// Requested acceleration
        acceleration: f32,
    },
    /// Axis has no endstop to home against
    NoEndstop(AxisId),
    /// Homing travel bound exhausted without reaching the endstop
    EndstopTimeout {
        /// Axis that failed to home
        axis: AxisId,
        /// Travel bound in steps
        travel: i32,
    },
}

/// Filament transport errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Operation refused because the feeder is jammed
    Jammed,
    /// Retry budget exhausted while loading or unloading
    Jam {
        /// Attempts made before giving up
        attempts: u16,
    },
    /// Operation requires a selected channel
    NoChannelSelected,
    /// Channel index beyond the configured tool count
    ChannelOutOfRange {
        /// Requested channel
        channel: u8,
        /// Configured tool count
        tool_count: u8,
    },
    /// Operator declined a required confirmation
    Declined,
}

/// Non-volatile storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The backing device reported a failure
    Io,
    /// Record does not fit the device
    OutOfBounds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Transport(e) => write!(f, "Transport error: {}", e),
            Error::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::OutOfRange {
                field,
                value,
                replaced_with,
            } => write!(
                f,
                "'{}' = {} is out of range, using {}",
                field, value, replaced_with
            ),
            ConfigError::RejectedValue { field, value } => {
                write!(f, "'{}' = {} is out of range", field, value)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::Busy(axis) => write!(f, "{} is already moving", axis),
            MotorError::Disabled(axis) => write!(f, "{} is not enabled", axis),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidRequest => write!(f, "Zero-length move requested"),
            MotionError::UnitMismatch { axis, unit } => {
                write!(f, "{} cannot be moved in {}", axis, unit)
            }
            MotionError::InvalidParameters {
                max_speed,
                acceleration,
            } => write!(
                f,
                "Cannot plan with max speed {} and acceleration {}",
                max_speed, acceleration
            ),
            MotionError::NoEndstop(axis) => write!(f, "{} has no endstop", axis),
            MotionError::EndstopTimeout { axis, travel } => write!(
                f,
                "{} endstop not reached within {} steps",
                axis, travel
            ),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Jammed => write!(f, "Feeder is jammed"),
            TransportError::Jam { attempts } => {
                write!(f, "Feeder jammed after {} attempts", attempts)
            }
            TransportError::NoChannelSelected => write!(f, "No channel selected"),
            TransportError::ChannelOutOfRange {
                channel,
                tool_count,
            } => write!(
                f,
                "Channel {} out of range (tool count {})",
                channel, tool_count
            ),
            TransportError::Declined => write!(f, "Operation declined"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io => write!(f, "Storage device failure"),
            StorageError::OutOfBounds => write!(f, "Record exceeds storage capacity"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}
