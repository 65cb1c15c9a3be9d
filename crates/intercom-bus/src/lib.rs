//! Home automation bus seam.
//!
//! The controller publishes its availability and doorbell presses and
//! listens for remote unlock commands. [`BusClient`] is the publish side;
//! inbound messages arrive as [`BusMessage`]s on a channel returned by the
//! adapter's constructor.
//!
//! - [`MqttBus`]: production adapter over `rumqttc`, with automatic
//!   reconnection and subscription renewal on every broker (re)connect.
//! - [`MockBus`]: records publishes for tests.

pub mod error;
pub mod mock;
pub mod mqtt;
pub mod topics;

use std::future::Future;

pub use error::{BusError, Result};
pub use mock::MockBus;
pub use mqtt::MqttBus;
pub use topics::Topics;

/// One message received from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Publish side of the bus.
///
/// Publishing is best-effort: a failure is reported to the caller, which
/// logs it and carries on.
pub trait BusClient: Send + Sync {
    /// Publish `payload` on `topic`.
    fn publish(&self, topic: &str, payload: &str) -> impl Future<Output = Result<()>> + Send;
}
