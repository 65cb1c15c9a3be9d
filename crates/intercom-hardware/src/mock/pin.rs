//! Mock input and output pins.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{HardwareError, Result};
use crate::traits::{InputPin, OutputPin};
use crate::types::Level;

#[derive(Debug)]
struct OutputState {
    level: Level,
    history: Vec<Level>,
}

/// Output pin that records every level written to it.
///
/// Clones share the same recorded state, so a test can keep one clone and
/// hand the other to the code under test.
///
/// # Examples
///
/// ```
/// use intercom_hardware::mock::MockOutputPin;
/// use intercom_hardware::traits::OutputPin;
/// use intercom_hardware::Level;
///
/// let strike = MockOutputPin::new("strike");
/// strike.set_high().unwrap();
/// strike.set_low().unwrap();
///
/// assert_eq!(strike.history(), vec![Level::High, Level::Low]);
/// assert_eq!(strike.level(), Level::Low);
/// ```
#[derive(Debug, Clone)]
pub struct MockOutputPin {
    name: String,
    state: Arc<Mutex<OutputState>>,
    fail_high: Arc<AtomicBool>,
}

impl MockOutputPin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(OutputState {
                level: Level::Low,
                history: Vec::new(),
            })),
            fail_high: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current level.
    pub fn level(&self) -> Level {
        self.lock().level
    }

    /// Every level written, oldest first. Failed writes are not recorded.
    pub fn history(&self) -> Vec<Level> {
        self.lock().history.clone()
    }

    /// Number of low-to-high transitions written so far.
    pub fn pulses(&self) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|level| level.is_high())
            .count()
    }

    /// Make writes of [`Level::High`] fail until reset.
    pub fn fail_high_writes(&self, fail: bool) {
        self.fail_high.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, OutputState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OutputPin for MockOutputPin {
    fn set_level(&self, level: Level) -> Result<()> {
        if level.is_high() && self.fail_high.load(Ordering::SeqCst) {
            return Err(HardwareError::communication(format!(
                "{}: injected write failure",
                self.name
            )));
        }

        let mut state = self.lock();
        state.level = level;
        state.history.push(level);
        Ok(())
    }
}

/// Input pin whose edge-detection latch is set by the test.
#[derive(Debug, Clone, Default)]
pub struct MockInputPin {
    latched: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl MockInputPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch an edge, as the hardware would on a transition.
    pub fn trigger(&self) {
        self.latched.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent read fail.
    pub fn fail_reads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

impl InputPin for MockInputPin {
    fn edge_detected(&self) -> Result<bool> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("injected read failure"));
        }
        Ok(self.latched.swap(false, Ordering::SeqCst))
    }
}
