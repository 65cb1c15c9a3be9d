//! MQTT adapter over `rumqttc`.
//!
//! `rumqttc` splits a connection into an [`AsyncClient`] (request side) and
//! an [`EventLoop`] that must be polled for anything to happen. The adapter
//! owns the polling task: it renews the unlock subscription on every
//! `ConnAck`, forwards incoming publishes to the inbound channel, and keeps
//! polling after errors so the event loop reconnects on its own.
//!
//! Forwarding never waits on the consumer: a message that does not fit in
//! the inbound channel is dropped, so pings and publishes keep flowing while
//! the controller is busy with a door pulse.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use intercom_core::MqttSettings;
use intercom_core::constants::{
    BUS_CHANNEL_CAPACITY, MQTT_KEEPALIVE_SECS, MQTT_RECONNECT_SECS, MQTT_REQUEST_CAPACITY,
    PUBLISH_TIMEOUT_SECS,
};

use crate::error::{BusError, Result};
use crate::topics::Topics;
use crate::{BusClient, BusMessage};

/// MQTT-backed [`BusClient`].
#[derive(Clone)]
pub struct MqttBus {
    client: AsyncClient,
    topics: Topics,
    publish_timeout: Duration,
}

impl MqttBus {
    /// Configure the broker connection and start the event loop task.
    ///
    /// The connection itself is established in the background; this only
    /// fails on invalid settings. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Config`] when no broker host is configured.
    pub fn connect(settings: &MqttSettings) -> Result<(Self, mpsc::Receiver<BusMessage>)> {
        let host = settings
            .broker_host
            .as_deref()
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| BusError::Config("broker host is not set".to_string()))?;

        let mut options = MqttOptions::new(settings.client_id.clone(), host, settings.broker_port);
        options.set_keep_alive(Duration::from_secs(MQTT_KEEPALIVE_SECS));
        if let Some(username) = &settings.username {
            options.set_credentials(username.clone(), settings.password.clone().unwrap_or_default());
        }

        let (client, eventloop) = AsyncClient::new(options, MQTT_REQUEST_CAPACITY);
        let topics = Topics::new(&settings.base_topic);
        let (inbound_tx, inbound_rx) = mpsc::channel(BUS_CHANNEL_CAPACITY);

        info!(
            "Connecting to MQTT broker {}:{} as {}",
            host, settings.broker_port, settings.client_id
        );
        tokio::spawn(run_event_loop(
            eventloop,
            client.clone(),
            topics.unlock().to_string(),
            inbound_tx,
        ));

        let bus = Self {
            client,
            topics,
            publish_timeout: Duration::from_secs(PUBLISH_TIMEOUT_SECS),
        };
        Ok((bus, inbound_rx))
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}

impl BusClient for MqttBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        debug!("Publishing {} to {}", payload, topic);
        let request = self
            .client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec());

        match tokio::time::timeout(self.publish_timeout, request).await {
            Ok(result) => result.map_err(BusError::from),
            Err(_) => Err(BusError::Timeout(self.publish_timeout.as_millis() as u64)),
        }
    }
}

async fn run_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    unlock_topic: String,
    inbound: mpsc::Sender<BusMessage>,
) {
    let retry = Duration::from_secs(MQTT_RECONNECT_SECS);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT connected");
                // Non-blocking: this task is the one draining the request queue.
                match client.try_subscribe(unlock_topic.as_str(), QoS::AtLeastOnce) {
                    Ok(()) => info!("Subscribed to topic: {}", unlock_topic),
                    Err(e) => error!("Failed to subscribe to topic {}: {}", unlock_topic, e),
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = BusMessage::new(
                    publish.topic.clone(),
                    String::from_utf8_lossy(&publish.payload).into_owned(),
                );
                forward(&inbound, message);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT broker connection lost: {}", e);
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Hand a message to the consumer without waiting.
fn forward(inbound: &mpsc::Sender<BusMessage>, message: BusMessage) {
    debug!("Bus message on {}", message.topic);
    match inbound.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(message)) => {
            warn!("Bus consumer busy, dropping message on {}", message.topic);
        }
        Err(TrySendError::Closed(_)) => debug!("Bus consumer gone, message dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forward_drops_when_consumer_is_busy() {
        let (tx, mut rx) = mpsc::channel(1);

        forward(&tx, BusMessage::new("intercom/frontdoor/unlock", "1"));
        // Channel full: returns at once instead of stalling the event loop.
        forward(&tx, BusMessage::new("intercom/frontdoor/unlock", "2"));

        assert_eq!(rx.recv().await.unwrap().payload, "1");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forward_after_consumer_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        forward(&tx, BusMessage::new("intercom/frontdoor/unlock", ""));
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_connect_requires_broker_host() {
        let settings = MqttSettings {
            enabled: true,
            ..MqttSettings::default()
        };
        assert!(matches!(MqttBus::connect(&settings), Err(BusError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_builds_topics_without_broker() {
        let settings = MqttSettings {
            enabled: true,
            broker_host: Some("127.0.0.1".to_string()),
            broker_port: 1,
            base_topic: "home/door".to_string(),
            ..MqttSettings::default()
        };

        let (bus, _inbound) = MqttBus::connect(&settings).unwrap();
        assert_eq!(bus.topics().available(), "home/door/available");
    }
}
