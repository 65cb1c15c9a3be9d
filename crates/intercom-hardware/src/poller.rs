//! Polled edge detection.
//!
//! Edge detection registers latch a transition until read. Polling them at a
//! coarse interval (2 s by default) collapses contact bounce and repeated
//! presses within one window into a single edge.

use std::time::Duration;

use intercom_core::constants::EDGE_POLL_INTERVAL_MS;
use tracing::trace;

use crate::error::Result;
use crate::traits::{EdgeSource, InputPin};
use crate::types::Edge;

/// Default polling period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(EDGE_POLL_INTERVAL_MS);

/// [`EdgeSource`] that polls an [`InputPin`] at a fixed interval.
///
/// # Examples
///
/// ```
/// use intercom_hardware::mock::MockInputPin;
/// use intercom_hardware::traits::EdgeSource;
/// use intercom_hardware::{Edge, PollingEdgeSource};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> intercom_hardware::Result<()> {
/// let pin = MockInputPin::new();
/// let mut button = PollingEdgeSource::new(pin.clone(), Edge::Falling)
///     .with_interval(Duration::from_millis(10));
///
/// pin.trigger();
/// assert_eq!(button.next_edge().await?, Edge::Falling);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PollingEdgeSource<P> {
    pin: P,
    edge: Edge,
    interval: Duration,
}

impl<P: InputPin> PollingEdgeSource<P> {
    /// Watch `pin`, reporting each detection as `edge`.
    pub fn new(pin: P, edge: Edge) -> Self {
        Self {
            pin,
            edge,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<P: InputPin> EdgeSource for PollingEdgeSource<P> {
    async fn next_edge(&mut self) -> Result<Edge> {
        loop {
            tokio::time::sleep(self.interval).await;
            if self.pin.edge_detected()? {
                trace!(edge = ?self.edge, "Edge detected");
                return Ok(self.edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInputPin;

    #[tokio::test(start_paused = true)]
    async fn test_edge_reported_at_next_poll() {
        let pin = MockInputPin::new();
        let mut source = PollingEdgeSource::new(pin.clone(), Edge::Rising);
        pin.trigger();

        let started = tokio::time::Instant::now();
        assert_eq!(source.next_edge().await.unwrap(), Edge::Rising);
        assert!(started.elapsed() >= DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounce_within_window_is_one_edge() {
        let pin = MockInputPin::new();
        let mut source = PollingEdgeSource::new(pin.clone(), Edge::Falling);

        pin.trigger();
        pin.trigger();
        pin.trigger();
        source.next_edge().await.unwrap();

        // Latch was cleared by the first read.
        let second = tokio::time::timeout(Duration::from_secs(5), source.next_edge()).await;
        assert!(second.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_error_is_propagated() {
        let pin = MockInputPin::new();
        let mut source = PollingEdgeSource::new(pin.clone(), Edge::Falling);
        pin.fail_reads();

        assert!(source.next_edge().await.is_err());
    }
}
