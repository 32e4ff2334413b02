//! Builder pattern for PinAxisDriver.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::MechanicalConstraints;
use crate::error::{ConfigError, Error, Result};

use super::driver::PinAxisDriver;

/// Builder for creating PinAxisDriver instances.
pub struct PinAxisDriverBuilder<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: Option<EN>,
    endstop_pin: Option<END>,
    invert_direction: bool,
    enable_active_high: bool,
}

impl<STEP, DIR, EN, END> Default for PinAxisDriverBuilder<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, EN, END> PinAxisDriverBuilder<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            dir_pin: None,
            enable_pin: None,
            endstop_pin: None,
            invert_direction: false,
            enable_active_high: false,
        }
    }

    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the ENABLE pin.
    pub fn enable_pin(mut self, pin: EN) -> Self {
        self.enable_pin = Some(pin);
        self
    }

    /// Set the endstop input pin.
    pub fn endstop_pin(mut self, pin: END) -> Self {
        self.endstop_pin = Some(pin);
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Drive ENABLE high (instead of low) to energize the motor.
    pub fn enable_active_high(mut self, active_high: bool) -> Self {
        self.enable_active_high = active_high;
        self
    }

    /// Configure from derived axis constraints.
    pub fn from_constraints(self, constraints: &MechanicalConstraints) -> Self {
        self.invert_direction(constraints.invert_direction)
    }

    /// Build the PinAxisDriver.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin is missing.
    pub fn build(self) -> Result<PinAxisDriver<STEP, DIR, EN, END>> {
        let step_pin = self.step_pin.ok_or_else(|| missing("step_pin"))?;
        let dir_pin = self.dir_pin.ok_or_else(|| missing("dir_pin"))?;
        let enable_pin = self.enable_pin.ok_or_else(|| missing("enable_pin"))?;
        let endstop_pin = self.endstop_pin.ok_or_else(|| missing("endstop_pin"))?;

        Ok(PinAxisDriver::new(
            step_pin,
            dir_pin,
            enable_pin,
            endstop_pin,
            self.invert_direction,
            self.enable_active_high,
        ))
    }
}

fn missing(pin: &str) -> Error {
    let mut msg: heapless::String<128> = heapless::String::new();
    let _ = msg.push_str(pin);
    let _ = msg.push_str(" is required");
    Error::Config(ConfigError::ParseError(msg))
}
