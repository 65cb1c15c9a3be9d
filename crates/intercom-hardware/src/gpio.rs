//! Raspberry Pi GPIO through `rppal`.
//!
//! Inputs use the kernel's edge interrupts. Events queue up between polls,
//! so a press shorter than the poll interval is still seen; each poll drains
//! the queue and reports at most one edge.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rppal::gpio::{self, Gpio, Trigger};
use tracing::debug;

use crate::error::{HardwareError, Result};
use crate::traits::{InputPin, OutputPin};
use crate::types::{Edge, Level, PinMap};

/// Upper bound on queued interrupts drained in one poll.
const MAX_DRAINED_EVENTS: usize = 64;

/// Output pin driven through the GPIO peripheral.
pub struct GpioOutput {
    bcm: u8,
    pin: Mutex<gpio::OutputPin>,
}

impl GpioOutput {
    /// Claim `bcm` as an output, driven low.
    pub fn open(chip: &Gpio, bcm: u8) -> Result<Self> {
        let mut pin = chip.get(bcm).map_err(|e| driver_error(bcm, e))?.into_output();
        pin.set_low();
        Ok(Self {
            bcm,
            pin: Mutex::new(pin),
        })
    }

    pub fn bcm(&self) -> u8 {
        self.bcm
    }
}

impl fmt::Debug for GpioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioOutput").field("bcm", &self.bcm).finish()
    }
}

impl OutputPin for GpioOutput {
    fn set_level(&self, level: Level) -> Result<()> {
        debug!(bcm = self.bcm, %level, "GPIO write");
        lock(&self.pin).write(driver_level(level));
        Ok(())
    }
}

/// Input pin with interrupt-backed edge detection.
pub struct GpioInput {
    bcm: u8,
    pin: Mutex<gpio::InputPin>,
}

impl GpioInput {
    /// Claim `bcm` as an input and arm detection of `edge`.
    pub fn open(chip: &Gpio, bcm: u8, edge: Edge) -> Result<Self> {
        let mut pin = chip.get(bcm).map_err(|e| driver_error(bcm, e))?.into_input();
        pin.set_interrupt(trigger(edge)).map_err(|e| driver_error(bcm, e))?;
        Ok(Self {
            bcm,
            pin: Mutex::new(pin),
        })
    }

    pub fn bcm(&self) -> u8 {
        self.bcm
    }
}

impl fmt::Debug for GpioInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioInput").field("bcm", &self.bcm).finish()
    }
}

impl InputPin for GpioInput {
    fn edge_detected(&self) -> Result<bool> {
        let mut pin = lock(&self.pin);
        let mut detected = false;
        for _ in 0..MAX_DRAINED_EVENTS {
            match pin.poll_interrupt(false, Some(Duration::ZERO)) {
                Ok(Some(_)) => detected = true,
                Ok(None) => break,
                Err(e) => return Err(driver_error(self.bcm, e)),
            }
        }
        Ok(detected)
    }
}

/// Every pin of the intercom board, claimed from the GPIO peripheral.
#[derive(Debug)]
pub struct GpioBoard {
    pub door_strike: GpioOutput,
    pub red_light: GpioOutput,
    pub green_light: GpioOutput,
    pub call_button: GpioInput,
    pub door_feedback: GpioInput,
}

impl GpioBoard {
    /// Open the GPIO peripheral and claim the pins of `pins`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::CommunicationError`] when the peripheral is
    /// missing (not a Raspberry Pi, no access to the GPIO device) or a pin
    /// is already claimed.
    pub fn open(pins: &PinMap) -> Result<Self> {
        let chip = Gpio::new()
            .map_err(|e| HardwareError::communication(format!("GPIO unavailable: {}", e)))?;

        Ok(Self {
            door_strike: GpioOutput::open(&chip, pins.door_strike)?,
            red_light: GpioOutput::open(&chip, pins.red_light)?,
            green_light: GpioOutput::open(&chip, pins.green_light)?,
            call_button: GpioInput::open(&chip, pins.call_button, Edge::Falling)?,
            door_feedback: GpioInput::open(&chip, pins.door_feedback, Edge::Rising)?,
        })
    }
}

fn trigger(edge: Edge) -> Trigger {
    match edge {
        Edge::Rising => Trigger::RisingEdge,
        Edge::Falling => Trigger::FallingEdge,
    }
}

fn driver_level(level: Level) -> gpio::Level {
    match level {
        Level::Low => gpio::Level::Low,
        Level::High => gpio::Level::High,
    }
}

fn driver_error(bcm: u8, error: gpio::Error) -> HardwareError {
    HardwareError::communication(format!("GPIO {}: {}", bcm, error))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Edge::Rising, Trigger::RisingEdge)]
    #[case(Edge::Falling, Trigger::FallingEdge)]
    fn test_edge_maps_to_trigger(#[case] edge: Edge, #[case] expected: Trigger) {
        assert_eq!(trigger(edge), expected);
    }

    #[rstest]
    #[case(Level::Low, gpio::Level::Low)]
    #[case(Level::High, gpio::Level::High)]
    fn test_level_maps_to_driver(#[case] level: Level, #[case] expected: gpio::Level) {
        assert_eq!(driver_level(level), expected);
    }

    #[test]
    fn test_driver_error_names_pin() {
        let error = driver_error(17, gpio::Error::UnknownModel);
        assert!(error.to_string().starts_with("Communication error: GPIO 17: "));
    }
}
