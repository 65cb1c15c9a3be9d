//! Mock pin implementations for testing and development.
//!
//! These pins are controlled programmatically and record what the
//! controller did to them, without requiring physical hardware.

pub mod edge;
pub mod pin;

pub use edge::{MockEdgeHandle, MockEdgeSource};
pub use pin::{MockInputPin, MockOutputPin};
