//! Intercom controller binary.
//!
//! Every flag can also be set through its `INTERCOM_*` environment variable.
//!
//! Built with `--features hardware-gpio`, the binary drives the board through
//! Raspberry Pi GPIO; without it, or when GPIO cannot be opened off ARM, the
//! pins are detached and only logged.
//!
//! # Usage
//!
//! ```bash
//! # Call a number through baresip on the default control socket
//! intercom --phone-number 0612345678
//!
//! # Same, plus Home Assistant over MQTT
//! INTERCOM_PHONE_NUMBER=0612345678 \
//! INTERCOM_MQTT_ENABLED=true \
//! INTERCOM_MQTT_BROKER_HOST=broker.local \
//! intercom
//!
//! # Bus only, no calling engine
//! intercom --voice-enabled false --mqtt-enabled true --mqtt-broker-host broker.local
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use intercom_bus::MqttBus;
use intercom_controller::{CallController, DoorController, Indicators, Orchestrator, Sources};
use intercom_core::constants::{
    DEFAULT_BASE_TOPIC, DEFAULT_CONTROL_PORT, DEFAULT_MQTT_CLIENT_ID, DEFAULT_MQTT_PORT,
};
use intercom_core::{ControlSettings, MqttSettings, Settings, VERSION};
use intercom_hardware::{AnyOutputPin, Edge, Panel, PinMap, PollingEdgeSource};
use intercom_network::{ControlClient, ControlClientConfig};

/// Intercom controller bridging a door panel with baresip and MQTT
#[derive(Parser, Debug)]
#[command(name = "intercom")]
#[command(version)]
struct Args {
    /// Host of the baresip ctrl_tcp socket
    #[arg(long, env = "INTERCOM_CONTROL_HOST", default_value = "localhost")]
    control_host: String,

    /// Port of the baresip ctrl_tcp socket
    #[arg(long, env = "INTERCOM_CONTROL_PORT", default_value_t = DEFAULT_CONTROL_PORT)]
    control_port: u16,

    /// Use the calling engine
    #[arg(long, env = "INTERCOM_VOICE_ENABLED", default_value_t = true, action = ArgAction::Set)]
    voice_enabled: bool,

    /// Number dialed when the button is pressed
    #[arg(long, env = "INTERCOM_PHONE_NUMBER")]
    phone_number: Option<String>,

    /// Connect to the MQTT broker
    #[arg(long, env = "INTERCOM_MQTT_ENABLED", default_value_t = false, action = ArgAction::Set)]
    mqtt_enabled: bool,

    /// MQTT broker host
    #[arg(long, env = "INTERCOM_MQTT_BROKER_HOST")]
    mqtt_broker_host: Option<String>,

    /// MQTT broker port
    #[arg(long, env = "INTERCOM_MQTT_BROKER_PORT", default_value_t = DEFAULT_MQTT_PORT)]
    mqtt_broker_port: u16,

    /// MQTT client identifier
    #[arg(long, env = "INTERCOM_MQTT_CLIENT_ID", default_value = DEFAULT_MQTT_CLIENT_ID)]
    mqtt_client_id: String,

    /// Base path of the unlock, available and call topics
    #[arg(long, env = "INTERCOM_MQTT_BASE_TOPIC", default_value = DEFAULT_BASE_TOPIC)]
    mqtt_base_topic: String,

    /// MQTT username
    #[arg(long, env = "INTERCOM_MQTT_USERNAME")]
    mqtt_username: Option<String>,

    /// MQTT password
    #[arg(long, env = "INTERCOM_MQTT_PASSWORD", hide_env_values = true)]
    mqtt_password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "INTERCOM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            control: ControlSettings {
                host: self.control_host.clone(),
                port: self.control_port,
            },
            voice_enabled: self.voice_enabled,
            phone_number: self.phone_number.clone(),
            mqtt: MqttSettings {
                enabled: self.mqtt_enabled,
                broker_host: self.mqtt_broker_host.clone(),
                broker_port: self.mqtt_broker_port,
                client_id: self.mqtt_client_id.clone(),
                base_topic: self.mqtt_base_topic.clone(),
                username: self.mqtt_username.clone(),
                password: self.mqtt_password.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let settings = args.settings();
    settings.validate().context("Invalid configuration")?;

    info!("Intercom controller {} starting", VERSION);

    let Panel {
        door_strike,
        red_light,
        green_light,
        call_button,
        door_feedback,
    } = Panel::open(&PinMap::default()).context("Failed to open GPIO")?;

    let door = Arc::new(DoorController::new(door_strike));
    let indicators = Indicators::new(Arc::new(red_light), Arc::new(green_light));
    let button = PollingEdgeSource::new(call_button, Edge::Falling);
    let door_feedback = PollingEdgeSource::new(door_feedback, Edge::Rising);

    let mut builder =
        Orchestrator::<ControlClient, AnyOutputPin, MqttBus>::builder(door, indicators);

    let mut control = None;
    if let Some(number) = settings.dial_number() {
        let address = settings.control.address();
        let (client, streams) = ControlClient::connect(ControlClientConfig::new(address.as_str()))
            .await
            .with_context(|| format!("Control socket unreachable at {}", address))?;

        builder = builder.with_voice(Arc::new(CallController::new(client)), number);
        control = Some(streams);
    } else {
        info!("Voice calling disabled");
    }

    let mut bus = None;
    if settings.mqtt.enabled {
        let (client, messages) =
            MqttBus::connect(&settings.mqtt).context("Failed to configure MQTT client")?;

        builder = builder.with_bus(client, &settings.mqtt.base_topic);
        bus = Some(messages);
    }

    let orchestrator = Arc::new(builder.build());
    let mut tasks = orchestrator.start(Sources {
        button,
        door_feedback,
        control,
        bus,
    });
    info!("Intercom controller running");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
        _ = async {
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    error!("Task failed: {}", e);
                }
            }
        } => {
            warn!("All tasks stopped");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_need_a_number() {
        let args = Args::try_parse_from(["intercom"]).unwrap();
        let settings = args.settings();

        assert_eq!(settings.control.address(), "localhost:4444");
        assert!(settings.voice_enabled);
        assert!(!settings.mqtt.enabled);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_full_command_line() {
        let args = Args::try_parse_from([
            "intercom",
            "--phone-number",
            "0612345678",
            "--control-host",
            "baresip",
            "--mqtt-enabled",
            "true",
            "--mqtt-broker-host",
            "broker.local",
            "--mqtt-base-topic",
            "home/door",
        ])
        .unwrap();
        let settings = args.settings();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.dial_number(), Some("0612345678"));
        assert_eq!(settings.control.address(), "baresip:4444");
        assert_eq!(settings.mqtt.base_topic, "home/door");
    }

    #[test]
    fn test_voice_can_be_disabled() {
        let args = Args::try_parse_from(["intercom", "--voice-enabled", "false"]).unwrap();
        let settings = args.settings();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.dial_number(), None);
    }
}
