//! Recording softphone for tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use intercom_network::ClientError;

use crate::softphone::Softphone;

/// A command issued to a [`MockSoftphone`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftphoneCall {
    Dial(String),
    Hangup,
    Play(String),
}

/// [`Softphone`] that records every command in order.
///
/// Failed commands are recorded too, so a test can tell an attempt from a
/// command that was never issued. Clones share the same record.
///
/// # Examples
///
/// ```
/// use intercom_controller::Softphone;
/// use intercom_controller::mock::{MockSoftphone, SoftphoneCall};
///
/// # #[tokio::main]
/// # async fn main() {
/// let phone = MockSoftphone::new();
/// phone.fail_dials(true);
///
/// assert!(phone.dial("100").await.is_err());
/// assert_eq!(phone.calls(), vec![SoftphoneCall::Dial("100".to_string())]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSoftphone {
    calls: Arc<Mutex<Vec<SoftphoneCall>>>,
    fail_dial: Arc<AtomicBool>,
    fail_hangup: Arc<AtomicBool>,
    dial_delay_ms: Arc<AtomicU64>,
}

impl MockSoftphone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received, oldest first.
    pub fn calls(&self) -> Vec<SoftphoneCall> {
        self.lock().clone()
    }

    pub fn hangups(&self) -> usize {
        self.count(|call| matches!(call, SoftphoneCall::Hangup))
    }

    /// Number of times `file` was played.
    pub fn plays_of(&self, file: &str) -> usize {
        self.count(|call| matches!(call, SoftphoneCall::Play(f) if f == file))
    }

    pub fn fail_dials(&self, fail: bool) {
        self.fail_dial.store(fail, Ordering::SeqCst);
    }

    pub fn fail_hangups(&self, fail: bool) {
        self.fail_hangup.store(fail, Ordering::SeqCst);
    }

    /// Make every dial take `delay` to complete, as a slow socket write would.
    pub fn delay_dials(&self, delay: Duration) {
        self.dial_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn count(&self, predicate: impl Fn(&SoftphoneCall) -> bool) -> usize {
        self.lock().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: SoftphoneCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SoftphoneCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Softphone for MockSoftphone {
    async fn dial(&self, number: &str) -> Result<(), ClientError> {
        self.record(SoftphoneCall::Dial(number.to_string()));
        let delay = self.dial_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_dial.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        Ok(())
    }

    async fn hangup(&self) -> Result<(), ClientError> {
        self.record(SoftphoneCall::Hangup);
        if self.fail_hangup.load(Ordering::SeqCst) {
            return Err(ClientError::NotConnected);
        }
        Ok(())
    }

    async fn play(&self, file: &str) -> Result<(), ClientError> {
        self.record(SoftphoneCall::Play(file.to_string()));
        Ok(())
    }
}
