//! Frame scanning for the length-prefixed control socket format.
//!
//! # Wire Format
//!
//! ```text
//! <decimal-length>:<json-payload>,
//! 48:{"command":"reginfo","params":"","token":"ping"},
//! ^^ ^
//! |  payload starts after the colon, exactly `length` bytes long
//! length (1-3 ASCII digits)
//! ```
//!
//! The scanner looks for the first `:{` marker and reads the decimal digits
//! immediately before it. At most [`MAX_LENGTH_DIGITS`] digits are read, so a
//! payload of 1000 bytes or more is mis-parsed. The engine never sends such
//! payloads to this controller; the limit is kept as-is.
//!
//! Scanning never fails. Noise and unusable length fields are reported as
//! bytes to discard, and a short buffer is reported as incomplete so the
//! caller can wait for the rest of a partial TCP read.

use bytes::Bytes;
use intercom_core::Result;
use intercom_core::constants::{MAX_BUFFER_SIZE, MAX_LENGTH_DIGITS, PAYLOAD_MARKER};

use crate::message::Inbound;

/// Outcome of scanning a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScan {
    /// A complete payload occupies `buf[start..start + len]`.
    Complete { start: usize, len: usize },

    /// More bytes are needed. The first `discard` bytes are noise.
    Incomplete { discard: usize },

    /// The length field is unusable. Drop the first `discard` bytes
    /// (through the colon) and scan again.
    Skip { discard: usize },
}

/// Scan `buf` for the next frame.
///
/// # Examples
///
/// ```
/// use intercom_protocol::{FrameScan, scan_frame};
///
/// assert_eq!(scan_frame(b"2:{}"), FrameScan::Complete { start: 2, len: 2 });
/// assert_eq!(scan_frame(b"10:{\"a\""), FrameScan::Incomplete { discard: 0 });
/// assert_eq!(scan_frame(b"x:{}"), FrameScan::Skip { discard: 2 });
/// ```
pub fn scan_frame(buf: &[u8]) -> FrameScan {
    let Some(marker) = find_marker(buf) else {
        // Keep the tail: it may be the start of a length field.
        let discard = if buf.len() > MAX_BUFFER_SIZE {
            buf.len() - 1
        } else {
            0
        };
        return FrameScan::Incomplete { discard };
    };

    let digits = buf[..marker]
        .iter()
        .rev()
        .take(MAX_LENGTH_DIGITS)
        .take_while(|b| b.is_ascii_digit())
        .count();
    let digits_start = marker - digits;

    let len = match parse_length(&buf[digits_start..marker]) {
        Some(len) if len > 0 => len,
        _ => return FrameScan::Skip { discard: marker + 1 },
    };

    let start = marker + 1;
    if buf.len() < start + len {
        return FrameScan::Incomplete {
            discard: digits_start,
        };
    }

    FrameScan::Complete { start, len }
}

fn find_marker(buf: &[u8]) -> Option<usize> {
    buf.windows(PAYLOAD_MARKER.len())
        .position(|window| window == PAYLOAD_MARKER)
}

fn parse_length(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// One decoded record: the raw JSON payload of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, for logging.
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }

    /// Classify the payload as a response, event or unrecognized record.
    pub fn classify(&self) -> Result<Inbound> {
        Inbound::classify(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_complete_frame() {
        let buf = br#"48:{"command":"reginfo","params":"","token":"ping"},"#;
        assert_eq!(scan_frame(buf), FrameScan::Complete { start: 3, len: 48 });
    }

    #[test]
    fn test_single_digit_length() {
        assert_eq!(scan_frame(b"2:{},"), FrameScan::Complete { start: 2, len: 2 });
    }

    #[test]
    fn test_leading_comma_is_discarded_noise() {
        // Trailing comma of the previous record in front of a 2-digit length.
        let buf = br#",14:{"event":true},"#;
        assert_eq!(scan_frame(buf), FrameScan::Complete { start: 4, len: 14 });
    }

    #[test]
    fn test_incomplete_reports_noise_prefix() {
        assert_eq!(
            scan_frame(br#",14:{"event""#),
            FrameScan::Incomplete { discard: 1 }
        );
    }

    #[rstest]
    #[case(&b""[..])]
    #[case(&b"4"[..])]
    #[case(&b"48"[..])]
    #[case(&b"48:"[..])]
    #[case(&b","[..])]
    fn test_no_marker_is_incomplete(#[case] buf: &[u8]) {
        assert_eq!(scan_frame(buf), FrameScan::Incomplete { discard: 0 });
    }

    #[rstest]
    #[case(&b":{}"[..], 1)]
    #[case(&b"ab:{}"[..], 3)]
    #[case(&b"0:{}"[..], 2)]
    #[case(&b"000:{}"[..], 4)]
    fn test_unusable_length_is_skipped(#[case] buf: &[u8], #[case] discard: usize) {
        assert_eq!(scan_frame(buf), FrameScan::Skip { discard });
    }

    #[test]
    fn test_four_digit_length_reads_last_three() {
        // Documented protocol limit: "1005" is read as "005".
        assert_eq!(
            scan_frame(b"1005:{abcd}"),
            FrameScan::Complete { start: 5, len: 5 }
        );
    }

    #[test]
    fn test_oversized_noise_is_trimmed() {
        let noise = vec![b'x'; MAX_BUFFER_SIZE + 10];
        assert_eq!(
            scan_frame(&noise),
            FrameScan::Incomplete {
                discard: noise.len() - 1
            }
        );
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(Bytes::from_static(br#"{"event":true,"type":"CALL_CLOSED"}"#));
        assert_eq!(frame.len(), 35);
        assert!(!frame.is_empty());
        assert!(frame.as_text().contains("CALL_CLOSED"));
        assert!(matches!(frame.classify().unwrap(), Inbound::Event(_)));
    }
}
