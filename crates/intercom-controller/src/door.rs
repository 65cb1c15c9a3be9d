//! Door strike control and door-sensor policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{error, info};

use intercom_hardware::OutputPin;

use crate::error::Result;

/// How a door-sensor edge should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackVerdict {
    /// The door opened during a pulse issued by this controller. Expected.
    SystemRelease,

    /// The door was released by hand with no call in progress. Logged only.
    IdleManualRelease,

    /// The door was released by hand while a call is active: the resident
    /// answered on the analog handset, so the call is hung up.
    ManualOverride,
}

impl FeedbackVerdict {
    pub fn requires_hangup(self) -> bool {
        self == FeedbackVerdict::ManualOverride
    }
}

/// Decide what a door-sensor edge means.
///
/// # Examples
///
/// ```
/// use intercom_controller::{FeedbackVerdict, classify_feedback};
///
/// assert_eq!(classify_feedback(true, true), FeedbackVerdict::SystemRelease);
/// assert_eq!(classify_feedback(false, false), FeedbackVerdict::IdleManualRelease);
/// assert_eq!(classify_feedback(false, true), FeedbackVerdict::ManualOverride);
/// ```
pub fn classify_feedback(unlocked_by_system: bool, call_active: bool) -> FeedbackVerdict {
    if unlocked_by_system {
        FeedbackVerdict::SystemRelease
    } else if call_active {
        FeedbackVerdict::ManualOverride
    } else {
        FeedbackVerdict::IdleManualRelease
    }
}

/// Owner of the door strike.
///
/// Pulses are serialized by the strike lock. The unlocked-by-system flag is
/// only written while that lock is held, so it is set for exactly one pulse
/// at a time.
#[derive(Debug)]
pub struct DoorController<P> {
    strike: Mutex<P>,
    unlocked_by_system: AtomicBool,
}

impl<P: OutputPin> DoorController<P> {
    pub fn new(strike: P) -> Self {
        Self {
            strike: Mutex::new(strike),
            unlocked_by_system: AtomicBool::new(false),
        }
    }

    /// Release the door for `duration`.
    ///
    /// The strike is driven low and the flag cleared even when driving it
    /// high failed.
    ///
    /// # Errors
    ///
    /// Returns the first pin error encountered.
    pub async fn unlock(&self, duration: Duration) -> Result<()> {
        let strike = self.strike.lock().await;
        self.unlocked_by_system.store(true, Ordering::SeqCst);
        info!("Unlocking door for {:?}", duration);

        let released = match strike.set_high() {
            Ok(()) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            Err(e) => {
                error!("Failed to release door strike: {}", e);
                Err(e)
            }
        };

        let locked = strike.set_low();
        if let Err(e) = &locked {
            error!("Failed to lock door strike: {}", e);
        }
        self.unlocked_by_system.store(false, Ordering::SeqCst);
        info!("Door locked");

        released?;
        locked?;
        Ok(())
    }

    /// Whether a system-initiated pulse is in progress.
    pub fn unlocked_by_system(&self) -> bool {
        self.unlocked_by_system.load(Ordering::SeqCst)
    }
}
