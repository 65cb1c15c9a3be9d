//! Call and door logic of the intercom controller.
//!
//! This crate contains the two guarded state machines of the intercom and
//! the orchestrator that feeds them:
//!
//! - [`CallController`]: the single call, toggled by the button and synced
//!   from engine events;
//! - [`DoorController`]: the door strike pulse and the door-sensor policy;
//! - [`Orchestrator`]: one task per input source, merging button presses,
//!   door-sensor edges, engine events and remote unlock commands.
//!
//! The calling engine is reached through the [`Softphone`] trait, which the
//! control socket client implements.

pub mod call;
pub mod door;
pub mod error;
pub mod mock;
pub mod orchestrator;
pub mod softphone;

pub use call::{CallController, CallSnapshot, ToggleOutcome};
pub use door::{DoorController, FeedbackVerdict, classify_feedback};
pub use error::{ControllerError, Result};
pub use orchestrator::{Indicators, Orchestrator, OrchestratorBuilder, Sources};
pub use softphone::Softphone;
