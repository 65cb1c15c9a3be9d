//! Pin abstraction layer for the intercom controller.
//!
//! The controller drives three outputs (door strike, red call light, green
//! liveness light) and watches two inputs (call button, door-closed
//! sensor). This crate defines the traits at that seam and provides:
//!
//! - [`PollingEdgeSource`]: turns a latched-edge [`InputPin`] into an
//!   [`EdgeSource`] with a noise-suppression interval;
//! - [`DetachedPin`]: a no-op pin for hosts without GPIO;
//! - [`Panel`]: every pin of the board, on Raspberry Pi GPIO when built
//!   with the `hardware-gpio` feature, detached otherwise;
//! - [`mock`]: recording pins and channel-driven edge sources for tests.
//!
//! # Example
//!
//! ```
//! use intercom_hardware::mock::{MockEdgeSource, MockOutputPin};
//! use intercom_hardware::traits::{EdgeSource, OutputPin};
//!
//! #[tokio::main]
//! async fn main() -> intercom_hardware::Result<()> {
//!     let (mut button, handle) = MockEdgeSource::new("call button");
//!     let red = MockOutputPin::new("red");
//!
//!     handle.press().await?;
//!     button.next_edge().await?;
//!     red.set_high()?;
//!
//!     assert_eq!(red.pulses(), 1);
//!     Ok(())
//! }
//! ```
//!
//! [`InputPin`]: traits::InputPin
//! [`EdgeSource`]: traits::EdgeSource

pub mod detached;
pub mod devices;
pub mod error;
#[cfg(feature = "hardware-gpio")]
pub mod gpio;
pub mod mock;
pub mod panel;
pub mod poller;
pub mod traits;
pub mod types;

pub use detached::DetachedPin;
pub use devices::{AnyInputPin, AnyOutputPin};
pub use error::{HardwareError, Result};
pub use panel::Panel;
pub use poller::{DEFAULT_POLL_INTERVAL, PollingEdgeSource};
pub use traits::{EdgeSource, InputPin, OutputPin};
pub use types::{Edge, Level, PinMap};
