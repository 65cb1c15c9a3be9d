//! Integration tests for ControlCodec over async streams.
//!
//! These tests drive the codec through `FramedRead`/`FramedWrite` on an
//! in-memory duplex pipe, the same way the control client uses it on TCP.

use futures::{SinkExt, StreamExt};
use intercom_protocol::{Command, ControlCodec, EventKind, Inbound};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, FramedWrite};

const ESTABLISHED: &[u8] = br#"{"event":true,"type":"CALL_ESTABLISHED","class":"call","accountaor":"sip:door@pbx","direction":"outgoing","peeruri":"sip:100@pbx","id":"a1","param":""}"#;

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{}:", payload.len()).into_bytes();
    bytes.extend_from_slice(payload);
    bytes.push(b',');
    bytes
}

#[tokio::test]
async fn test_split_writes_reassemble() {
    let (mut tx, rx) = tokio::io::duplex(64);
    let mut reader = FramedRead::new(rx, ControlCodec::new());

    let bytes = frame(ESTABLISHED);
    tokio::spawn(async move {
        for piece in bytes.chunks(7) {
            tx.write_all(piece).await.unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    let frame = reader.next().await.unwrap().unwrap();
    match frame.classify().unwrap() {
        Inbound::Event(event) => {
            assert_eq!(event.kind(), EventKind::CallEstablished);
            assert_eq!(event.peeruri, "sip:100@pbx");
        }
        other => panic!("expected event, got {:?}", other),
    }

    // Writer dropped: stream ends cleanly despite the trailing comma.
    assert!(reader.next().await.is_none());
}

#[tokio::test]
async fn test_writer_and_reader_agree() {
    let (client, server) = tokio::io::duplex(1024);
    let mut writer = FramedWrite::new(client, ControlCodec::new());
    let mut reader = FramedRead::new(server, ControlCodec::new());

    writer.send(Command::dial("0612345678")).await.unwrap();
    writer.send(Command::liveness()).await.unwrap();
    writer.send(Command::hangup()).await.unwrap();
    drop(writer);

    let mut tokens = Vec::new();
    while let Some(frame) = reader.next().await {
        let command: Command = serde_json::from_slice(frame.unwrap().payload()).unwrap();
        tokens.push(command.token);
    }

    assert_eq!(tokens, vec!["dial_0612345678", "ping", "token"]);
}

#[tokio::test]
async fn test_noise_between_frames_is_dropped() {
    let (mut tx, rx) = tokio::io::duplex(1024);
    let mut reader = FramedRead::new(rx, ControlCodec::new());

    let mut bytes = b"garbage:{".to_vec();
    bytes.extend(frame(br#"{"response":true,"ok":true,"data":"","token":"ping"}"#));
    bytes.extend_from_slice(b"\r\n");
    bytes.extend(frame(ESTABLISHED));
    tx.write_all(&bytes).await.unwrap();
    drop(tx);

    let first = reader.next().await.unwrap().unwrap();
    assert!(matches!(first.classify().unwrap(), Inbound::Response(r) if r.is_liveness()));

    let second = reader.next().await.unwrap().unwrap();
    assert!(matches!(second.classify().unwrap(), Inbound::Event(_)));

    assert!(reader.next().await.is_none());
}
