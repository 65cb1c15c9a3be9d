use intercom_core::{Result, constants::LIVENESS_TOKEN};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply to a [`Command`](crate::Command), matched by its echoed token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub response: bool,

    #[serde(default)]
    pub ok: bool,

    #[serde(default)]
    pub data: String,

    #[serde(default)]
    pub token: String,
}

impl Response {
    pub fn is_liveness(&self) -> bool {
        self.token == LIVENESS_TOKEN
    }
}

/// Unsolicited notification from the calling engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub event: bool,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub accountaor: String,

    #[serde(default)]
    pub direction: String,

    #[serde(default)]
    pub peeruri: String,

    /// Call-leg identifier.
    #[serde(default)]
    pub id: String,

    /// Free-form parameter, e.g. the pressed DTMF digit.
    #[serde(default)]
    pub param: String,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.kind)
    }
}

/// Event types the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CallEstablished,
    /// Local SDP generated: the outbound leg is up and media is flowing.
    CallLocalSdp,
    CallClosed,
    DtmfStart,
    DtmfEnd,
    Other,
}

impl EventKind {
    pub fn from_type(tag: &str) -> Self {
        match tag {
            "CALL_ESTABLISHED" => EventKind::CallEstablished,
            "CALL_LOCAL_SDP" => EventKind::CallLocalSdp,
            "CALL_CLOSED" => EventKind::CallClosed,
            "CALL_DTMF_START" => EventKind::DtmfStart,
            "CALL_DTMF_END" => EventKind::DtmfEnd,
            _ => EventKind::Other,
        }
    }

    /// Whether this event means the remote leg is up.
    pub fn marks_call_up(&self) -> bool {
        matches!(self, EventKind::CallEstablished | EventKind::CallLocalSdp)
    }
}

/// A decoded record, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Response(Response),
    Event(Event),
    /// Valid JSON matching neither shape.
    Unrecognized(Value),
}

impl Inbound {
    /// Classify a JSON payload.
    ///
    /// A record is a [`Response`] when its `response` flag is set, otherwise
    /// an [`Event`] when its `event` flag is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](intercom_core::Error::Json) when the payload
    /// is not valid JSON or a flagged record has fields of the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use intercom_protocol::Inbound;
    ///
    /// let inbound = Inbound::classify(br#"{"response":true,"ok":true,"data":"","token":"ping"}"#).unwrap();
    /// assert!(matches!(inbound, Inbound::Response(r) if r.is_liveness()));
    /// ```
    pub fn classify(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;

        if flag_set(&value, "response") {
            return Ok(Inbound::Response(serde_json::from_value(value)?));
        }

        if flag_set(&value, "event") {
            return Ok(Inbound::Event(serde_json::from_value(value)?));
        }

        Ok(Inbound::Unrecognized(value))
    }
}

fn flag_set(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DTMF: &[u8] = br#"{"event":true,"type":"CALL_DTMF_START","class":"call","accountaor":"sip:door@pbx","direction":"outgoing","peeruri":"sip:0612345678@pbx","id":"3f2a","param":"5"}"#;

    #[test]
    fn test_classify_response() {
        let inbound =
            Inbound::classify(br#"{"response":true,"ok":true,"data":"done","token":"dial_42"}"#)
                .unwrap();
        match inbound {
            Inbound::Response(r) => {
                assert!(r.ok);
                assert_eq!(r.data, "done");
                assert_eq!(r.token, "dial_42");
                assert!(!r.is_liveness());
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_event() {
        match Inbound::classify(DTMF).unwrap() {
            Inbound::Event(e) => {
                assert_eq!(e.kind(), EventKind::DtmfStart);
                assert_eq!(e.param, "5");
                assert_eq!(e.id, "3f2a");
                assert_eq!(e.peeruri, "sip:0612345678@pbx");
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_response_flag_false_is_not_a_response() {
        let inbound = Inbound::classify(br#"{"response":false,"token":"x"}"#).unwrap();
        assert!(matches!(inbound, Inbound::Unrecognized(_)));
    }

    #[test]
    fn test_missing_fields_default() {
        match Inbound::classify(br#"{"event":true,"type":"CALL_CLOSED"}"#).unwrap() {
            Inbound::Event(e) => {
                assert_eq!(e.kind(), EventKind::CallClosed);
                assert!(e.param.is_empty());
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[rstest]
    #[case(&b"not json"[..])]
    #[case(&b"{\"event\":tru"[..])]
    #[case(&b""[..])]
    fn test_invalid_json_is_error(#[case] payload: &[u8]) {
        assert!(Inbound::classify(payload).is_err());
    }

    #[test]
    fn test_unrecognized_object() {
        let inbound = Inbound::classify(br#"{"hello":"world"}"#).unwrap();
        assert!(matches!(inbound, Inbound::Unrecognized(_)));
    }

    #[rstest]
    #[case("CALL_ESTABLISHED", EventKind::CallEstablished, true)]
    #[case("CALL_LOCAL_SDP", EventKind::CallLocalSdp, true)]
    #[case("CALL_CLOSED", EventKind::CallClosed, false)]
    #[case("CALL_DTMF_START", EventKind::DtmfStart, false)]
    #[case("CALL_DTMF_END", EventKind::DtmfEnd, false)]
    #[case("REGISTER_OK", EventKind::Other, false)]
    fn test_event_kind(#[case] tag: &str, #[case] kind: EventKind, #[case] up: bool) {
        assert_eq!(EventKind::from_type(tag), kind);
        assert_eq!(kind.marks_call_up(), up);
    }
}
