//! Error types for pin operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while driving or watching pins.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The signal source has gone away (channel closed, driver unloaded).
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A level write or edge read failed at the driver.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}
