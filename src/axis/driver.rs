//! Axis hardware capability.
//!
//! The interrupt pump only ever talks to hardware through [`AxisDriver`]. The
//! provided [`PinAxisDriver`] implements it over embedded-hal 1.0 pins.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::error::MotorError;
use crate::motion::Direction;

/// Hardware operations needed to drive one axis.
///
/// Implementations are called from the interrupt context and must not block.
pub trait AxisDriver {
    /// Emit one step pulse.
    fn pulse(&mut self) -> Result<(), MotorError>;

    /// Read the raw endstop input level (`true` = high).
    fn read_endstop(&mut self) -> Result<bool, MotorError>;

    /// Energize or release the motor.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError>;

    /// Set the logical direction of the next pulses.
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError>;
}

/// Axis driver built on STEP/DIR/ENABLE outputs and an endstop input.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: ENABLE pin type (must implement `OutputPin`)
/// - `END`: endstop pin type (must implement `InputPin`)
pub struct PinAxisDriver<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    endstop_pin: END,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Whether the enable input is active high (most drivers are active low).
    enable_active_high: bool,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,
}

impl<STEP, DIR, EN, END> PinAxisDriver<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    /// Start building a driver.
    pub fn builder() -> super::PinAxisDriverBuilder<STEP, DIR, EN, END> {
        super::PinAxisDriverBuilder::new()
    }

    pub(crate) fn new(
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: EN,
        endstop_pin: END,
        invert_direction: bool,
        enable_active_high: bool,
    ) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            endstop_pin,
            invert_direction,
            enable_active_high,
            current_direction: None,
        }
    }

    /// Give the pins back.
    pub fn release(self) -> (STEP, DIR, EN, END) {
        (self.step_pin, self.dir_pin, self.enable_pin, self.endstop_pin)
    }
}

impl<STEP, DIR, EN, END> AxisDriver for PinAxisDriver<STEP, DIR, EN, END>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    END: InputPin,
{
    fn pulse(&mut self) -> Result<(), MotorError> {
        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        self.step_pin.set_low().map_err(|_| MotorError::PinError)
    }

    fn read_endstop(&mut self) -> Result<bool, MotorError> {
        self.endstop_pin.is_high().map_err(|_| MotorError::PinError)
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        let pin_high = enabled == self.enable_active_high;
        if pin_high {
            self.enable_pin.set_high()
        } else {
            self.enable_pin.set_low()
        }
        .map_err(|_| MotorError::PinError)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Forward => !self.invert_direction,
            Direction::Reverse => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.current_direction = Some(direction);
        Ok(())
    }
}

/// Placeholder for an absent pin.
///
/// Writes are ignored and reads return low, so an axis without an endstop
/// never reports it triggered (with the default high trigger level).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}
