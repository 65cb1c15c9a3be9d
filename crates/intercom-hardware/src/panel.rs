//! The intercom panel: every pin of the board, opened together.
//!
//! [`Panel::open`] claims the GPIO pins of a [`PinMap`] when the
//! `hardware-gpio` feature is built in and the peripheral opens. Otherwise
//! the panel runs on detached pins, except on ARM targets where a GPIO
//! failure means a miswired or misconfigured device and is reported.

#[cfg(feature = "hardware-gpio")]
use tracing::info;
use tracing::warn;

use crate::detached::DetachedPin;
use crate::devices::{AnyInputPin, AnyOutputPin};
use crate::error::Result;
#[cfg(feature = "hardware-gpio")]
use crate::gpio::GpioBoard;
use crate::types::PinMap;

/// Outputs and inputs of the intercom board.
#[derive(Debug)]
pub struct Panel {
    pub door_strike: AnyOutputPin,
    pub red_light: AnyOutputPin,
    pub green_light: AnyOutputPin,

    /// Falling edge on press.
    pub call_button: AnyInputPin,

    /// Rising edge when the door is released.
    pub door_feedback: AnyInputPin,
}

impl Panel {
    /// Open the board described by `pins`.
    ///
    /// # Errors
    ///
    /// Returns the GPIO error on ARM targets built with `hardware-gpio`
    /// when the peripheral cannot be opened. Every other target falls back
    /// to [`Panel::detached`].
    pub fn open(pins: &PinMap) -> Result<Self> {
        #[cfg(feature = "hardware-gpio")]
        {
            match GpioBoard::open(pins) {
                Ok(board) => {
                    info!(?pins, "GPIO opened");
                    return Ok(Self::from_board(board));
                }
                Err(e) if cfg!(any(target_arch = "arm", target_arch = "aarch64")) => {
                    return Err(e);
                }
                Err(e) => warn!("{}, running with detached pins", e),
            }
        }

        #[cfg(not(feature = "hardware-gpio"))]
        warn!(?pins, "Built without GPIO support, running with detached pins");

        Ok(Self::detached())
    }

    /// A panel whose pins are not wired to anything.
    pub fn detached() -> Self {
        Self {
            door_strike: AnyOutputPin::Detached(DetachedPin::new("door strike")),
            red_light: AnyOutputPin::Detached(DetachedPin::new("red light")),
            green_light: AnyOutputPin::Detached(DetachedPin::new("green light")),
            call_button: AnyInputPin::Detached(DetachedPin::new("call button")),
            door_feedback: AnyInputPin::Detached(DetachedPin::new("door sensor")),
        }
    }

    /// Whether the pins drive real hardware.
    pub fn is_hardware(&self) -> bool {
        self.door_strike.is_hardware()
    }

    #[cfg(feature = "hardware-gpio")]
    fn from_board(board: GpioBoard) -> Self {
        Self {
            door_strike: AnyOutputPin::Gpio(board.door_strike),
            red_light: AnyOutputPin::Gpio(board.red_light),
            green_light: AnyOutputPin::Gpio(board.green_light),
            call_button: AnyInputPin::Gpio(board.call_button),
            door_feedback: AnyInputPin::Gpio(board.door_feedback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{InputPin, OutputPin};

    #[test]
    fn test_detached_panel() {
        let panel = Panel::detached();

        assert!(!panel.is_hardware());
        assert!(panel.door_strike.set_high().is_ok());
        assert!(!panel.call_button.edge_detected().unwrap());
        assert!(!panel.door_feedback.edge_detected().unwrap());
    }

    // Test hosts have no GPIO peripheral; only ARM builds with GPIO support
    // treat that as fatal.
    #[cfg(not(all(
        feature = "hardware-gpio",
        any(target_arch = "arm", target_arch = "aarch64")
    )))]
    #[test]
    fn test_open_falls_back_to_detached() {
        let panel = Panel::open(&PinMap::default()).unwrap();
        assert!(!panel.is_hardware());
    }
}
