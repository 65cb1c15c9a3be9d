//! Error type of the controller.

use intercom_hardware::HardwareError;
use intercom_network::ClientError;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors surfaced by the call and door controllers.
///
/// None of these are fatal: the orchestrator logs them and keeps serving
/// the next input. Bus publish failures never reach this type; they are
/// logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// A command to the calling engine failed.
    #[error("Softphone command failed: {0}")]
    Softphone(#[from] ClientError),

    /// A pin could not be driven.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strike_write() -> std::result::Result<(), HardwareError> {
        Err(HardwareError::communication("GPIO 17 write failed"))
    }

    fn pulse() -> Result<()> {
        strike_write()?;
        Ok(())
    }

    #[test]
    fn test_hardware_error_converts() {
        let error = pulse().unwrap_err();
        assert!(matches!(error, ControllerError::Hardware(_)));
        assert_eq!(
            error.to_string(),
            "Hardware error: Communication error: GPIO 17 write failed"
        );
    }

    #[test]
    fn test_softphone_error_converts() {
        let error = ControllerError::from(ClientError::NotConnected);
        assert!(matches!(error, ControllerError::Softphone(ClientError::NotConnected)));
        assert!(error.to_string().starts_with("Softphone command failed: "));
    }
}
