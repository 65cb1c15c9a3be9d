//! Property-based tests for the control socket framing.
//!
//! These tests feed encoded frames to the decoder in arbitrary pieces and
//! verify that partial TCP reads never produce errors or spurious records.

use bytes::BytesMut;
use intercom_core::constants::MAX_PAYLOAD_LEN;
use intercom_protocol::{Command, ControlCodec, Frame, Verb};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

/// Encode a command to its wire bytes.
fn wire(command: Command) -> Vec<u8> {
    let mut buffer = BytesMut::new();
    ControlCodec::new().encode(command, &mut buffer).unwrap();
    buffer.to_vec()
}

/// Feed `bytes` to a fresh decoder in chunks of `chunk` bytes and collect
/// every frame produced.
fn decode_in_chunks(bytes: &[u8], chunk: usize) -> Vec<Frame> {
    let mut codec = ControlCodec::new();
    let mut buffer = BytesMut::new();
    let mut frames = Vec::new();

    for piece in bytes.chunks(chunk) {
        buffer.extend_from_slice(piece);
        while let Some(frame) = codec.decode(&mut buffer).unwrap() {
            frames.push(frame);
        }
    }

    frames
}

/// Strategy for play parameters that keep the payload within 999 bytes.
fn file_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_.-]{0,470}")
        .expect("Failed to create file name regex strategy")
}

/// Strategy for phone numbers.
fn phone_number() -> impl Strategy<Value = String> {
    prop::string::string_regex("\\+?[0-9]{1,20}").expect("Failed to create number regex strategy")
}

#[test]
fn every_payload_length_survives_byte_by_byte_delivery() {
    for len in 1..=MAX_PAYLOAD_LEN {
        let payload = format!("{{{}", "a".repeat(len - 1));
        let frame = format!("{}:{},", len, payload);

        let frames = decode_in_chunks(frame.as_bytes(), 1);

        assert_eq!(frames.len(), 1, "length {}", len);
        assert_eq!(frames[0].payload(), payload.as_bytes(), "length {}", len);
    }
}

proptest! {
    /// Property: a play command round-trips through single-byte reads.
    #[test]
    fn prop_play_roundtrip_one_byte_chunks(file in file_name()) {
        let original = Command::play(&file);
        let frames = decode_in_chunks(&wire(original.clone()), 1);

        prop_assert_eq!(frames.len(), 1);
        let decoded: Command = serde_json::from_slice(frames[0].payload()).unwrap();
        prop_assert_eq!(decoded, original);
    }

    /// Property: a dial command round-trips whatever the read size.
    #[test]
    fn prop_dial_roundtrip_any_chunk_size(number in phone_number(), chunk in 1usize..64) {
        let original = Command::dial(&number);
        let frames = decode_in_chunks(&wire(original.clone()), chunk);

        prop_assert_eq!(frames.len(), 1);
        let decoded: Command = serde_json::from_slice(frames[0].payload()).unwrap();
        prop_assert_eq!(decoded.verb, Verb::Dial);
        prop_assert_eq!(decoded, original);
    }

    /// Property: any strict prefix of a frame yields no record and no error.
    #[test]
    fn prop_prefix_yields_nothing(file in file_name(), cut in any::<prop::sample::Index>()) {
        let bytes = wire(Command::play(&file));
        // The trailing comma is not part of the record, so stop before the
        // last payload byte.
        let prefix_len = cut.index(bytes.len() - 1);

        let mut codec = ControlCodec::new();
        let mut buffer = BytesMut::from(&bytes[..prefix_len]);

        let result = codec.decode(&mut buffer);
        prop_assert!(result.is_ok());
        prop_assert!(result.unwrap().is_none());
    }

    /// Property: back-to-back frames come out in wire order.
    #[test]
    fn prop_sequence_preserves_order(
        numbers in prop::collection::vec(phone_number(), 1..8),
        chunk in 1usize..32,
    ) {
        let mut bytes = Vec::new();
        for number in &numbers {
            bytes.extend(wire(Command::dial(number)));
        }

        let frames = decode_in_chunks(&bytes, chunk);
        prop_assert_eq!(frames.len(), numbers.len());

        for (frame, number) in frames.iter().zip(&numbers) {
            let decoded: Command = serde_json::from_slice(frame.payload()).unwrap();
            prop_assert_eq!(decoded.params.as_deref(), Some(number.as_str()));
        }
    }
}
