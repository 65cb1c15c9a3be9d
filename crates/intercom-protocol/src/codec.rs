//! Tokio codec for the control socket framing.
//!
//! `ControlCodec` plugs the [`scan_frame`] scanner into `tokio_util`'s
//! [`Decoder`] and serializes [`Command`]s through [`Encoder`].
//!
//! ```text
//! TCP Stream -> Decoder -> Frame (raw JSON payload)
//! Command -> Encoder -> TCP Stream ("<len>:<json>,")
//! ```
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use intercom_protocol::{Command, ControlCodec};
//!
//! # async fn example() -> intercom_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:4444").await?;
//! let mut framed = Framed::new(stream, ControlCodec::new());
//!
//! framed.send(Command::liveness()).await?;
//! if let Some(Ok(frame)) = framed.next().await {
//!     println!("Received: {}", frame.as_text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Decoding never fails on noise: unusable length fields are skipped and a
//! partial frame yields `Ok(None)`. Encoding fails only when the payload does
//! not fit the three-digit length field.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{Frame, FrameScan, scan_frame};
use crate::Command;
use intercom_core::constants::{FRAME_TERMINATOR, LENGTH_SEPARATOR, MAX_PAYLOAD_LEN};
use intercom_core::{Error, Result};

/// Codec for length-prefixed JSON records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlCodec;

impl ControlCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for ControlCodec {
    type Item = Frame;
    type Error = Error;

    /// Extract the next frame from the receive buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Frame))` - A complete frame was extracted
    /// - `Ok(None)` - Need more data
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use intercom_protocol::ControlCodec;
    ///
    /// let mut codec = ControlCodec::new();
    /// let mut buffer = BytesMut::from(&b"14:{\"event\":true"[..]);
    /// assert!(codec.decode(&mut buffer).unwrap().is_none());
    ///
    /// buffer.extend_from_slice(b"},");
    /// let frame = codec.decode(&mut buffer).unwrap().unwrap();
    /// assert_eq!(frame.payload(), b"{\"event\":true}");
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            match scan_frame(src) {
                FrameScan::Complete { start, len } => {
                    src.advance(start);
                    let payload = src.split_to(len).freeze();
                    return Ok(Some(Frame::new(payload)));
                }
                FrameScan::Incomplete { discard } => {
                    src.advance(discard);
                    return Ok(None);
                }
                FrameScan::Skip { discard } => {
                    src.advance(discard);
                }
            }
        }
    }

    /// Drain what is left when the peer closes.
    ///
    /// The trailing comma of the last record (or a truncated frame) is
    /// dropped instead of being reported as an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                src.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<Command> for ControlCodec {
    type Error = Error;

    /// Write `<len>:<json>,` to the destination buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameTooLarge`] when the JSON payload exceeds
    /// 999 bytes.
    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        let payload = serde_json::to_vec(&item)?;

        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::FrameTooLarge {
                size: payload.len(),
                max_size: MAX_PAYLOAD_LEN,
            });
        }

        let length = payload.len().to_string();
        dst.reserve(length.len() + payload.len() + 2);
        dst.put_slice(length.as_bytes());
        dst.put_u8(LENGTH_SEPARATOR);
        dst.put_slice(&payload);
        dst.put_u8(FRAME_TERMINATOR);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Inbound, Verb};

    const LIVENESS_WIRE: &[u8] = br#"48:{"command":"reginfo","params":"","token":"ping"},"#;

    #[test]
    fn test_encode_liveness_matches_wire() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode(Command::liveness(), &mut buffer).unwrap();
        assert_eq!(&buffer[..], LIVENESS_WIRE);
    }

    #[test]
    fn test_encode_hangup() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        codec.encode(Command::hangup(), &mut buffer).unwrap();
        assert_eq!(&buffer[..], br#"36:{"command":"hangup","token":"token"},"#);
    }

    #[test]
    fn test_encode_too_large() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        let number = "1".repeat(MAX_PAYLOAD_LEN);

        let result = codec.encode(Command::dial(&number), &mut buffer);
        match result {
            Err(Error::FrameTooLarge { size, max_size }) => {
                assert_eq!(max_size, MAX_PAYLOAD_LEN);
                assert!(size > max_size);
            }
            other => panic!("Expected FrameTooLarge error, got {:?}", other),
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_complete_message() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::from(LIVENESS_WIRE);

        let frame = codec.decode(&mut buffer).unwrap().unwrap();
        let cmd: Command = serde_json::from_slice(frame.payload()).unwrap();
        assert_eq!(cmd.verb, Verb::Reginfo);
        // Only the trailing comma is left behind.
        assert_eq!(&buffer[..], b",");
    }

    #[test]
    fn test_decode_multiple_messages_in_buffer() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(br#"14:{"event":true},"#);
        buffer.extend_from_slice(br#"52:{"response":true,"ok":true,"data":"","token":"ping"},"#);

        let first = codec.decode(&mut buffer).unwrap().unwrap();
        assert!(matches!(first.classify().unwrap(), Inbound::Event(_)));

        let second = codec.decode(&mut buffer).unwrap().unwrap();
        assert!(matches!(second.classify().unwrap(), Inbound::Response(r) if r.is_liveness()));

        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_skips_garbage_length() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        buffer.extend_from_slice(b"zz:{");
        buffer.extend_from_slice(br#"14:{"event":true},"#);

        let frame = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(frame.payload(), br#"{"event":true}"#);
    }

    #[test]
    fn test_decode_empty_buffer() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::new();
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_decode_eof_drops_leftovers() {
        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::from(&b",48:{\"command\""[..]);
        assert!(codec.decode_eof(&mut buffer).unwrap().is_none());
        assert!(buffer.is_empty());
    }
}
