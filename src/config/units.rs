//! Unit types for physical quantities.
//!
//! Type-safe representations of linear distance, rotation, step rates and
//! motor steps so that selector millimeters never get mixed up with revolver
//! steps.

use core::fmt;
use core::ops::{Add, Sub};

use serde::Deserialize;

macro_rules! float_unit {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f32);

        impl $name {
            /// Raw value.
            #[inline]
            pub const fn value(self) -> f32 {
                self.0
            }
        }
    };
}

float_unit! {
    /// Linear distance in millimeters (selector and feeder axes).
    Millimeters
}

float_unit! {
    /// Angular distance in degrees (revolver axis).
    Degrees
}

float_unit! {
    /// Step rate in steps per second.
    StepsPerSec
}

float_unit! {
    /// Step acceleration in steps per second squared.
    StepsPerSecSquared
}

/// Axis position or displacement in steps.
///
/// Uses i32 so the interrupt context can update it with a single
/// word-sized atomic store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct Steps(pub i32);

impl Steps {
    /// Raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Convert a physical amount to steps, truncating toward zero.
    #[inline]
    pub fn from_units(amount: f32, steps_per_unit: f32) -> Self {
        Self((amount * steps_per_unit) as i32)
    }

    /// Convert to a physical amount.
    #[inline]
    pub fn to_units(self, steps_per_unit: f32) -> f32 {
        if steps_per_unit > 0.0 {
            self.0 as f32 / steps_per_unit
        } else {
            0.0
        }
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Unit of a movement request issued by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Unit {
    /// Raw motor steps (any axis).
    Steps,
    /// Millimeters (linear axes only).
    Millimeters,
    /// Degrees (rotary axis only).
    Degrees,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Steps => write!(f, "steps"),
            Unit::Millimeters => write!(f, "millimeters"),
            Unit::Degrees => write!(f, "degrees"),
        }
    }
}
