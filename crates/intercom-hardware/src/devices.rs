//! Enum wrappers for pin dispatch.
//!
//! The controller is generic over its pin types. The binary picks real GPIO
//! or detached pins at startup, so it needs one concrete type covering both;
//! these enums provide it without boxing. The GPIO variants exist only with
//! the `hardware-gpio` feature.
//!
//! # Examples
//!
//! ```
//! use intercom_hardware::devices::AnyOutputPin;
//! use intercom_hardware::mock::MockOutputPin;
//! use intercom_hardware::{Level, OutputPin};
//!
//! let strike = MockOutputPin::new("strike");
//! let pin = AnyOutputPin::Mock(strike.clone());
//!
//! pin.set_high().unwrap();
//! assert_eq!(strike.level(), Level::High);
//! ```

use crate::detached::DetachedPin;
#[cfg(feature = "hardware-gpio")]
use crate::gpio::{GpioInput, GpioOutput};
use crate::mock::{MockInputPin, MockOutputPin};
use crate::traits::{InputPin, OutputPin};
use crate::{Level, Result};

/// Enum wrapper for output pin dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyOutputPin {
    /// Not wired; writes are logged.
    Detached(DetachedPin),

    /// Recording pin for tests.
    Mock(MockOutputPin),

    /// Raspberry Pi GPIO.
    #[cfg(feature = "hardware-gpio")]
    Gpio(GpioOutput),
}

impl AnyOutputPin {
    pub fn is_hardware(&self) -> bool {
        #[cfg(feature = "hardware-gpio")]
        if let Self::Gpio(_) = self {
            return true;
        }
        false
    }
}

impl OutputPin for AnyOutputPin {
    fn set_level(&self, level: Level) -> Result<()> {
        match self {
            Self::Detached(pin) => pin.set_level(level),
            Self::Mock(pin) => pin.set_level(level),
            #[cfg(feature = "hardware-gpio")]
            Self::Gpio(pin) => pin.set_level(level),
        }
    }
}

/// Enum wrapper for input pin dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyInputPin {
    /// Not wired; never reports an edge.
    Detached(DetachedPin),

    /// Manually triggered pin for tests.
    Mock(MockInputPin),

    /// Raspberry Pi GPIO.
    #[cfg(feature = "hardware-gpio")]
    Gpio(GpioInput),
}

impl AnyInputPin {
    pub fn is_hardware(&self) -> bool {
        #[cfg(feature = "hardware-gpio")]
        if let Self::Gpio(_) = self {
            return true;
        }
        false
    }
}

impl InputPin for AnyInputPin {
    fn edge_detected(&self) -> Result<bool> {
        match self {
            Self::Detached(pin) => pin.edge_detected(),
            Self::Mock(pin) => pin.edge_detected(),
            #[cfg(feature = "hardware-gpio")]
            Self::Gpio(pin) => pin.edge_detected(),
        }
    }
}
