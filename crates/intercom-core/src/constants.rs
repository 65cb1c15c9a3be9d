//! Core constants for the intercom controller.
//!
//! This module centralizes the wire-level constants of the baresip control
//! socket and the timing parameters of the controller loops.
//!
//! # Wire Format
//!
//! Each record on the control socket is a netstring-like frame:
//!
//! ```text
//! <decimal-length>:<json-payload>,
//! 48:{"command":"reginfo","params":"","token":"ping"},
//! ```
//!
//! # Usage
//!
//! ```
//! use intercom_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(LIVENESS_TOKEN, "ping");
//! let interval = Duration::from_secs(KEEPALIVE_INTERVAL_SECS);
//! assert!(interval > Duration::from_secs(RECONNECT_BACKOFF_SECS));
//! ```

// ============================================================================
// Wire Format
// ============================================================================

/// Separator between the length field and the JSON payload.
pub const LENGTH_SEPARATOR: u8 = b':';

/// Marker that introduces a JSON object payload: the separator followed by `{`.
pub const PAYLOAD_MARKER: &[u8] = b":{";

/// Trailing byte closing every frame.
pub const FRAME_TERMINATOR: u8 = b',';

/// Maximum number of decimal digits read in front of [`PAYLOAD_MARKER`].
///
/// The control protocol never sends payloads of 1000 bytes or more to this
/// controller, so only the last three digits are read. A longer payload is
/// mis-parsed on decode; this is a documented protocol limit.
pub const MAX_LENGTH_DIGITS: usize = 3;

/// Largest payload that fits the length field (`999`).
pub const MAX_PAYLOAD_LEN: usize = 999;

/// Buffer size past which marker-less noise is discarded.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

// ============================================================================
// Correlation Tokens
// ============================================================================

/// Reserved token of the liveness probe. Replies carrying it are routed to
/// the liveness channel instead of the general response channel.
pub const LIVENESS_TOKEN: &str = "ping";

/// Token used by every hangup command.
pub const HANGUP_TOKEN: &str = "token";

// ============================================================================
// Control Client Timing
// ============================================================================

/// Interval between liveness probes (seconds).
pub const KEEPALIVE_INTERVAL_SECS: u64 = 10;

/// Wait after a failed reconnect attempt (seconds).
pub const RECONNECT_BACKOFF_SECS: u64 = 1;

/// Deadline applied to every socket write (seconds).
pub const WRITE_TIMEOUT_SECS: u64 = 2;

/// Deadline applied to every connect attempt (seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 3;

/// Default TCP port of baresip's `ctrl_tcp` module.
pub const DEFAULT_CONTROL_PORT: u16 = 4444;

// ============================================================================
// Channel Capacities
// ============================================================================

/// Capacity of the general response channel.
pub const RESPONSE_CHANNEL_CAPACITY: usize = 10;

/// Capacity of the event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 10;

/// Capacity of the liveness channel.
pub const LIVENESS_CHANNEL_CAPACITY: usize = 2;

/// Capacity of the inbound bus message channel. Messages arriving while it
/// is full are dropped so the MQTT event loop is never stalled.
pub const BUS_CHANNEL_CAPACITY: usize = 8;

// ============================================================================
// Call and Door Timing
// ============================================================================

/// A call younger than this is left alone by a toggle (seconds).
pub const CALL_GRACE_SECS: u64 = 5;

/// Duration of a door strike pulse (seconds).
pub const UNLOCK_PULSE_SECS: u64 = 5;

/// Duration of the liveness indicator blink (seconds).
pub const LIVENESS_BLINK_SECS: u64 = 1;

/// Poll interval of polled input pins (milliseconds). Also suppresses noise.
pub const EDGE_POLL_INTERVAL_MS: u64 = 2000;

/// DTMF digit that releases the door during a call.
pub const UNLOCK_DIGIT: &str = "5";

// ============================================================================
// Announcements
// ============================================================================

/// Played after a successful dial.
pub const RINGBACK_SOUND: &str = "ringback.wav";

/// Played when a dial fails.
pub const ERROR_SOUND: &str = "error.wav";

/// Played when the door is released.
pub const UNLOCK_SOUND: &str = "portedoor.wav";

// ============================================================================
// Bus
// ============================================================================

/// Default MQTT broker port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default MQTT client identifier.
pub const DEFAULT_MQTT_CLIENT_ID: &str = "intercom";

/// Default base path of the bus topics.
pub const DEFAULT_BASE_TOPIC: &str = "intercom/frontdoor";

/// Payload published on the availability topic.
pub const AVAILABLE_PAYLOAD: &str = "online";

/// Payload published on the call topic.
pub const CALL_PAYLOAD: &str = "ON";

/// Wait before retrying a lost broker connection (seconds).
pub const MQTT_RECONNECT_SECS: u64 = 5;

/// MQTT keep-alive period (seconds).
pub const MQTT_KEEPALIVE_SECS: u64 = 30;

/// Deadline for queuing a publish (seconds).
pub const PUBLISH_TIMEOUT_SECS: u64 = 2;

/// Capacity of the MQTT client request queue.
pub const MQTT_REQUEST_CAPACITY: usize = 10;
