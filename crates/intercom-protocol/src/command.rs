//! Outbound commands sent to the calling engine.
//!
//! Every command carries a correlation token chosen by the caller. The
//! engine echoes the token in its [`Response`](crate::Response), which is
//! how the control client tells liveness replies apart from the rest.
//!
//! # Wire Shapes
//!
//! ```text
//! {"command":"dial","params":"0612345678","token":"dial_0612345678"}
//! {"command":"play","params":"ringback.wav","token":"play_ringback.wav"}
//! {"command":"hangup","token":"token"}
//! {"command":"reginfo","params":"","token":"ping"}
//! ```

use intercom_core::constants::{HANGUP_TOKEN, LIVENESS_TOKEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command verb understood by baresip's command dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    /// Place an outbound call.
    Dial,

    /// Terminate the current call.
    Hangup,

    /// Play an audio file on the local device.
    Play,

    /// Registration info query, used as the liveness probe.
    Reginfo,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Verb::Dial => "dial",
            Verb::Hangup => "hangup",
            Verb::Play => "play",
            Verb::Reginfo => "reginfo",
        };
        write!(f, "{}", verb)
    }
}

/// Outbound request on the control socket.
///
/// Use the constructors rather than building the struct by hand; they pick
/// the token conventions the engine and this controller agree on.
///
/// # Examples
///
/// ```
/// use intercom_protocol::{Command, Verb};
///
/// let cmd = Command::dial("0612345678");
/// assert_eq!(cmd.verb, Verb::Dial);
/// assert_eq!(cmd.token, "dial_0612345678");
///
/// assert!(Command::liveness().is_liveness());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    pub verb: Verb,

    /// String parameter; omitted from the wire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,

    pub token: String,
}

impl Command {
    pub fn new(verb: Verb, params: Option<String>, token: impl Into<String>) -> Self {
        Self {
            verb,
            params,
            token: token.into(),
        }
    }

    pub fn dial(number: &str) -> Self {
        Self::new(Verb::Dial, Some(number.to_string()), format!("dial_{}", number))
    }

    pub fn hangup() -> Self {
        Self::new(Verb::Hangup, None, HANGUP_TOKEN)
    }

    pub fn play(file: &str) -> Self {
        Self::new(Verb::Play, Some(file.to_string()), format!("play_{}", file))
    }

    /// The reserved liveness probe.
    pub fn liveness() -> Self {
        Self::new(Verb::Reginfo, Some(String::new()), LIVENESS_TOKEN)
    }

    pub fn is_liveness(&self) -> bool {
        self.token == LIVENESS_TOKEN
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(params) if !params.is_empty() => {
                write!(f, "{} {} [{}]", self.verb, params, self.token)
            }
            _ => write!(f, "{} [{}]", self.verb, self.token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(cmd: &Command) -> String {
        serde_json::to_string(cmd).unwrap()
    }

    #[test]
    fn test_dial_shape() {
        assert_eq!(
            json(&Command::dial("0612345678")),
            r#"{"command":"dial","params":"0612345678","token":"dial_0612345678"}"#
        );
    }

    #[test]
    fn test_play_shape() {
        assert_eq!(
            json(&Command::play("ringback.wav")),
            r#"{"command":"play","params":"ringback.wav","token":"play_ringback.wav"}"#
        );
    }

    #[test]
    fn test_hangup_omits_params() {
        assert_eq!(
            json(&Command::hangup()),
            r#"{"command":"hangup","token":"token"}"#
        );
    }

    #[test]
    fn test_liveness_shape() {
        let payload = json(&Command::liveness());
        assert_eq!(payload, r#"{"command":"reginfo","params":"","token":"ping"}"#);
        assert_eq!(payload.len(), 48);
    }

    #[test]
    fn test_only_liveness_uses_reserved_token() {
        assert!(Command::liveness().is_liveness());
        assert!(!Command::dial("ping").is_liveness());
        assert!(!Command::hangup().is_liveness());
        assert!(!Command::play("ping").is_liveness());
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::dial("42").to_string(), "dial 42 [dial_42]");
        assert_eq!(Command::hangup().to_string(), "hangup [token]");
        assert_eq!(Command::liveness().to_string(), "reginfo [ping]");
    }
}
