//! Control socket client for the baresip calling engine.
//!
//! This crate owns the persistent TCP session to baresip's `ctrl_tcp`
//! module. It keeps the session alive with periodic liveness probes,
//! reconnects transparently, and demultiplexes inbound frames into three
//! bounded channels: command responses, events and liveness replies.
//!
//! # Example
//!
//! ```no_run
//! use intercom_network::{ControlClient, ControlClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ControlClientConfig::new("127.0.0.1:4444");
//! let (client, mut streams) = ControlClient::connect(config).await?;
//!
//! client.dial("0612345678").await?;
//! while let Some(event) = streams.events.recv().await {
//!     println!("{} {}", event.kind, event.param);
//! }
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{ClientError, ControlClient, ControlClientConfig, ControlStreams};
