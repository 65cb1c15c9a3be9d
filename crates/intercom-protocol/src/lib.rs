//! Wire protocol of the baresip `ctrl_tcp` control socket.
//!
//! Records are length-prefixed JSON objects (`<len>:<json>,`). This crate
//! provides the outbound [`Command`], the inbound [`Response`] and [`Event`]
//! shapes, the [`Frame`] scanner for partial reads, and [`ControlCodec`] for
//! use with `tokio_util::codec`.

pub mod codec;
pub mod command;
pub mod frame;
pub mod message;

pub use codec::ControlCodec;
pub use command::{Command, Verb};
pub use frame::{Frame, FrameScan, scan_frame};
pub use message::{Event, EventKind, Inbound, Response};
