//! Validated runtime settings.
//!
//! Settings are produced by the binary (flags and `INTERCOM_*` environment
//! variables) and must pass [`Settings::validate`] before any task starts.
//!
//! # Example
//!
//! ```
//! use intercom_core::Settings;
//!
//! let mut settings = Settings::default();
//! assert!(settings.validate().is_err()); // voice enabled, no number
//!
//! settings.phone_number = Some("+33612345678".to_string());
//! assert!(settings.validate().is_ok());
//! ```

use crate::constants::{
    DEFAULT_BASE_TOPIC, DEFAULT_CONTROL_PORT, DEFAULT_MQTT_CLIENT_ID, DEFAULT_MQTT_PORT,
};
use crate::{Error, Result};

/// Address of the baresip control socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    pub host: String,
    pub port: u16,
}

impl ControlSettings {
    /// `host:port` form accepted by `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_CONTROL_PORT,
        }
    }
}

/// Home automation bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub enabled: bool,
    pub broker_host: Option<String>,
    pub broker_port: u16,
    pub client_id: String,
    pub base_topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            broker_host: None,
            broker_port: DEFAULT_MQTT_PORT,
            client_id: DEFAULT_MQTT_CLIENT_ID.to_string(),
            base_topic: DEFAULT_BASE_TOPIC.to_string(),
            username: None,
            password: None,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub control: ControlSettings,

    /// Whether the voice-calling engine is used at all.
    pub voice_enabled: bool,

    /// Number dialed when the button is pressed.
    pub phone_number: Option<String>,

    pub mqtt: MqttSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            control: ControlSettings::default(),
            voice_enabled: true,
            phone_number: None,
            mqtt: MqttSettings::default(),
        }
    }
}

impl Settings {
    /// Reject configurations the controller cannot run with.
    ///
    /// # Errors
    ///
    /// - voice calling enabled without a phone number
    /// - bus enabled without a broker host
    /// - an empty control host while voice calling is enabled
    pub fn validate(&self) -> Result<()> {
        if self.voice_enabled && is_blank(self.phone_number.as_deref()) {
            return Err(Error::MissingConfig(
                "phone number (voice calling enabled)".to_string(),
            ));
        }

        if self.voice_enabled && self.control.host.trim().is_empty() {
            return Err(Error::MissingConfig("control socket host".to_string()));
        }

        if self.mqtt.enabled && is_blank(self.mqtt.broker_host.as_deref()) {
            return Err(Error::MissingConfig(
                "MQTT broker host (bus enabled)".to_string(),
            ));
        }

        if self.mqtt.enabled && self.mqtt.base_topic.trim_matches('/').is_empty() {
            return Err(Error::Config("MQTT base topic must not be empty".to_string()));
        }

        Ok(())
    }

    /// The configured number, if voice calling is enabled.
    pub fn dial_number(&self) -> Option<&str> {
        if self.voice_enabled {
            self.phone_number.as_deref()
        } else {
            None
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn voice_settings() -> Settings {
        Settings {
            phone_number: Some("0612345678".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.voice_enabled);
        assert!(!settings.mqtt.enabled);
        assert_eq!(settings.control.address(), "localhost:4444");
        assert_eq!(settings.mqtt.broker_port, 1883);
        assert_eq!(settings.mqtt.client_id, "intercom");
        assert_eq!(settings.mqtt.base_topic, "intercom/frontdoor");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn test_voice_without_number_is_fatal(#[case] number: Option<&str>) {
        let settings = Settings {
            phone_number: number.map(str::to_string),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::MissingConfig(_))));
    }

    #[test]
    fn test_voice_disabled_needs_no_number() {
        let settings = Settings {
            voice_enabled: false,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.dial_number(), None);
    }

    #[test]
    fn test_bus_without_broker_is_fatal() {
        let mut settings = voice_settings();
        settings.mqtt.enabled = true;
        assert!(matches!(settings.validate(), Err(Error::MissingConfig(_))));

        settings.mqtt.broker_host = Some("broker.local".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_base_topic_rejected() {
        let mut settings = voice_settings();
        settings.mqtt.enabled = true;
        settings.mqtt.broker_host = Some("broker.local".to_string());
        settings.mqtt.base_topic = "/".to_string();
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_dial_number() {
        let settings = voice_settings();
        assert_eq!(settings.dial_number(), Some("0612345678"));
    }
}
