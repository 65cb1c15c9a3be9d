//! Recording bus for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{BusError, Result};
use crate::{BusClient, BusMessage};

/// [`BusClient`] that records every publish.
///
/// Clones share the same record.
///
/// # Examples
///
/// ```
/// use intercom_bus::{BusClient, MockBus};
///
/// # #[tokio::main]
/// # async fn main() -> intercom_bus::Result<()> {
/// let bus = MockBus::new();
/// bus.publish("intercom/frontdoor/call", "ON").await?;
///
/// assert_eq!(bus.published_on("intercom/frontdoor/call"), vec!["ON"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    published: Arc<Mutex<Vec<BusMessage>>>,
    offline: Arc<AtomicBool>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every publish, oldest first.
    pub fn published(&self) -> Vec<BusMessage> {
        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Payloads published on `topic`, oldest first.
    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|message| message.topic == topic)
            .map(|message| message.payload)
            .collect()
    }

    /// Make publishes fail while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl BusClient for MockBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BusError::Unavailable("mock bus offline".to_string()));
        }

        self.published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(BusMessage::new(topic, payload));
        Ok(())
    }
}
