//! Error types for bus operations.

/// Result type alias for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors that can occur while talking to the bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Request could not be queued to the MQTT event loop.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// Publish did not complete within the deadline.
    #[error("Publish timeout after {0}ms")]
    Timeout(u64),

    /// Missing or invalid bus settings.
    #[error("Bus configuration error: {0}")]
    Config(String),

    /// The bus is not reachable.
    #[error("Bus unavailable: {0}")]
    Unavailable(String),
}
