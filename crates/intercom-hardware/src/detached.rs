//! Pins for hosts without GPIO hardware.
//!
//! The controller keeps running on a development machine: output writes are
//! logged and inputs never report an edge.

use tracing::debug;

use crate::error::Result;
use crate::traits::{InputPin, OutputPin};
use crate::types::Level;

/// A pin that is not wired to anything.
#[derive(Debug, Clone)]
pub struct DetachedPin {
    name: String,
}

impl DetachedPin {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl OutputPin for DetachedPin {
    fn set_level(&self, level: Level) -> Result<()> {
        debug!(pin = %self.name, %level, "Detached pin write");
        Ok(())
    }
}

impl InputPin for DetachedPin {
    fn edge_detected(&self) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_succeed() {
        let pin = DetachedPin::new("strike");
        assert!(pin.set_high().is_ok());
        assert!(pin.set_low().is_ok());
        assert_eq!(pin.name(), "strike");
    }

    #[test]
    fn test_never_detects_edges() {
        assert!(!DetachedPin::new("button").edge_detected().unwrap());
    }
}
