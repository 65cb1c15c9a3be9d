//! Pin trait definitions.
//!
//! Output writes are synchronous: setting a GPIO level is a register write
//! and never blocks. Edge sources are asynchronous and are consumed by
//! long-lived tasks, so their futures must be `Send`.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{Edge, Level};

/// A pin driven by the controller (door strike, indicator lights).
///
/// Implementations are shared between tasks and must be usable behind an
/// `Arc<dyn OutputPin>`.
pub trait OutputPin: Send + Sync {
    /// Drive the pin to `level`.
    fn set_level(&self, level: Level) -> Result<()>;

    fn set_high(&self) -> Result<()> {
        self.set_level(Level::High)
    }

    fn set_low(&self) -> Result<()> {
        self.set_level(Level::Low)
    }
}

impl<P: OutputPin + ?Sized> OutputPin for Arc<P> {
    fn set_level(&self, level: Level) -> Result<()> {
        (**self).set_level(level)
    }
}

/// An input pin with hardware edge detection.
pub trait InputPin: Send + Sync {
    /// Whether the configured edge occurred since the last call. Reading
    /// clears the detection.
    fn edge_detected(&self) -> Result<bool>;
}

/// A stream of edges on one input signal.
///
/// # Examples
///
/// ```no_run
/// use intercom_hardware::traits::EdgeSource;
/// use intercom_hardware::Result;
///
/// async fn count_presses<E: EdgeSource>(button: &mut E) -> Result<u32> {
///     let mut presses = 0;
///     while presses < 3 {
///         button.next_edge().await?;
///         presses += 1;
///     }
///     Ok(presses)
/// }
/// ```
pub trait EdgeSource: Send {
    /// Wait for the next edge.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying signal can no longer be read;
    /// the caller stops watching.
    fn next_edge(&mut self) -> impl Future<Output = Result<Edge>> + Send;
}
