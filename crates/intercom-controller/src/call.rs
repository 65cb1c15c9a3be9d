//! Call state and the operations that change it.
//!
//! # States
//!
//! ```text
//!          dial ok
//!   Idle ──────────> Active
//!    ^                 │
//!    └─────────────────┘
//!     hangup ok / remote close
//! ```
//!
//! Every mutating operation holds the call lock for its whole duration,
//! including the socket write. Two button presses racing each other
//! therefore cannot both dial, and a remote close cannot interleave with a
//! local hangup.
//!
//! # Debounce
//!
//! A toggle on a call younger than the grace period does nothing. This
//! absorbs the second press of an impatient visitor without hanging up the
//! call the first press started.

use std::fmt;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use intercom_core::constants::{CALL_GRACE_SECS, ERROR_SOUND, RINGBACK_SOUND};

use crate::error::Result;
use crate::softphone::Softphone;

/// What a [`CallController::toggle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Dialed,
    HungUp,
    /// The call is younger than the grace period; nothing was sent.
    Debounced,
}

impl fmt::Display for ToggleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleOutcome::Dialed => write!(f, "dialed"),
            ToggleOutcome::HungUp => write!(f, "hung up"),
            ToggleOutcome::Debounced => write!(f, "debounced"),
        }
    }
}

/// Point-in-time copy of the call state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallSnapshot {
    pub active: bool,
    pub started_at: Option<Instant>,
    pub number: Option<String>,
}

impl CallSnapshot {
    /// Time since the call started, if one is active.
    pub fn age(&self) -> Option<Duration> {
        self.started_at.map(|started| started.elapsed())
    }
}

#[derive(Debug, Default)]
struct Call {
    active: bool,
    started_at: Option<Instant>,
    number: Option<String>,
}

impl Call {
    fn start(&mut self, number: Option<String>) {
        self.active = true;
        self.started_at = Some(Instant::now());
        if number.is_some() {
            self.number = number;
        }
    }

    fn end(&mut self) {
        self.active = false;
        self.started_at = None;
    }

    fn older_than(&self, grace: Duration) -> bool {
        self.started_at
            .is_none_or(|started| started.elapsed() > grace)
    }
}

/// Owner of the single call of this intercom.
///
/// # Examples
///
/// ```
/// use intercom_controller::{CallController, ToggleOutcome};
/// use intercom_controller::mock::MockSoftphone;
///
/// # #[tokio::main]
/// # async fn main() -> intercom_controller::Result<()> {
/// let calls = CallController::new(MockSoftphone::new());
///
/// assert_eq!(calls.toggle("0612345678").await?, ToggleOutcome::Dialed);
/// assert!(calls.is_active().await);
///
/// // Pressed again right away: left alone.
/// assert_eq!(calls.toggle("0612345678").await?, ToggleOutcome::Debounced);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CallController<S> {
    softphone: S,
    call: Mutex<Call>,
    grace: Duration,
}

impl<S: Softphone> CallController<S> {
    pub fn new(softphone: S) -> Self {
        Self {
            softphone,
            call: Mutex::new(Call::default()),
            grace: Duration::from_secs(CALL_GRACE_SECS),
        }
    }

    /// Override the debounce grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn softphone(&self) -> &S {
        &self.softphone
    }

    /// Dial when idle, hang up when the call is past the grace period,
    /// otherwise do nothing. The check and the action are atomic.
    ///
    /// # Errors
    ///
    /// Returns the softphone error of the dial or hangup; the state is left
    /// unchanged.
    pub async fn toggle(&self, number: &str) -> Result<ToggleOutcome> {
        let mut call = self.call.lock().await;

        if !call.active {
            self.dial_locked(&mut call, number).await?;
            return Ok(ToggleOutcome::Dialed);
        }

        if call.older_than(self.grace) {
            self.hangup_locked(&mut call).await?;
            return Ok(ToggleOutcome::HungUp);
        }

        info!("Call started less than {:?} ago, ignoring toggle", self.grace);
        Ok(ToggleOutcome::Debounced)
    }

    /// Place a call to `number`.
    ///
    /// On success the call becomes active and the ringback announcement is
    /// played. On failure the error announcement is played and the state is
    /// unchanged.
    pub async fn dial(&self, number: &str) -> Result<()> {
        let mut call = self.call.lock().await;
        self.dial_locked(&mut call, number).await
    }

    /// Hang up the current call.
    pub async fn hangup(&self) -> Result<()> {
        let mut call = self.call.lock().await;
        self.hangup_locked(&mut call).await
    }

    /// Hang up only if a call is active.
    ///
    /// The check and the hangup happen under one acquisition of the call
    /// lock, so a dial in flight is either finished and hung up, or starts
    /// after this returns. Returns whether a hangup was sent.
    pub async fn hangup_if_active(&self) -> Result<bool> {
        let mut call = self.call.lock().await;
        if !call.active {
            return Ok(false);
        }
        self.hangup_locked(&mut call).await?;
        Ok(true)
    }

    /// The engine reports the remote leg up.
    pub async fn mark_established(&self) {
        let mut call = self.call.lock().await;
        if !call.active {
            info!("Call established remotely");
            call.start(None);
        }
    }

    /// The engine reports the call closed.
    pub async fn mark_closed(&self) {
        let mut call = self.call.lock().await;
        if call.active {
            info!("Call closed");
        }
        call.end();
    }

    pub async fn is_active(&self) -> bool {
        self.call.lock().await.active
    }

    pub async fn snapshot(&self) -> CallSnapshot {
        let call = self.call.lock().await;
        CallSnapshot {
            active: call.active,
            started_at: call.started_at,
            number: call.number.clone(),
        }
    }

    async fn dial_locked(&self, call: &mut Call, number: &str) -> Result<()> {
        info!("Dialing {}", number);

        if let Err(e) = self.softphone.dial(number).await {
            error!("Dial to {} failed: {}", number, e);
            if let Err(play_error) = self.softphone.play(ERROR_SOUND).await {
                warn!("Failed to play {}: {}", ERROR_SOUND, play_error);
            }
            return Err(e.into());
        }

        call.start(Some(number.to_string()));

        if let Err(e) = self.softphone.play(RINGBACK_SOUND).await {
            warn!("Failed to play {}: {}", RINGBACK_SOUND, e);
        }
        Ok(())
    }

    async fn hangup_locked(&self, call: &mut Call) -> Result<()> {
        info!("Hanging up");
        self.softphone.hangup().await?;
        call.end();
        Ok(())
    }
}
