//! Channel-driven edge source.

use tokio::sync::mpsc;

use crate::error::{HardwareError, Result};
use crate::traits::EdgeSource;
use crate::types::Edge;

/// Edge source fed through a [`MockEdgeHandle`].
///
/// # Examples
///
/// ```
/// use intercom_hardware::mock::MockEdgeSource;
/// use intercom_hardware::traits::EdgeSource;
/// use intercom_hardware::Edge;
///
/// #[tokio::main]
/// async fn main() -> intercom_hardware::Result<()> {
///     let (mut button, handle) = MockEdgeSource::new("call button");
///
///     handle.press().await?;
///     assert_eq!(button.next_edge().await?, Edge::Falling);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockEdgeSource {
    edge_rx: mpsc::Receiver<Edge>,
    name: String,
}

impl MockEdgeSource {
    pub fn new(name: impl Into<String>) -> (Self, MockEdgeHandle) {
        let name = name.into();
        let (edge_tx, edge_rx) = mpsc::channel(32);

        let source = Self {
            edge_rx,
            name: name.clone(),
        };
        let handle = MockEdgeHandle { edge_tx, name };

        (source, handle)
    }
}

impl EdgeSource for MockEdgeSource {
    async fn next_edge(&mut self) -> Result<Edge> {
        self.edge_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }
}

/// Handle for simulating edges on a [`MockEdgeSource`].
///
/// Dropping every handle ends the source with a disconnected error.
#[derive(Debug, Clone)]
pub struct MockEdgeHandle {
    edge_tx: mpsc::Sender<Edge>,
    name: String,
}

impl MockEdgeHandle {
    /// Send an edge to the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has been dropped.
    pub async fn send_edge(&self, edge: Edge) -> Result<()> {
        self.edge_tx
            .send(edge)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// A button press (falling edge).
    pub async fn press(&self) -> Result<()> {
        self.send_edge(Edge::Falling).await
    }

    /// A sensor opening (rising edge).
    pub async fn rise(&self) -> Result<()> {
        self.send_edge(Edge::Rising).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_edges_in_order() {
        let (mut source, handle) = MockEdgeSource::new("door sensor");
        handle.rise().await.unwrap();
        handle.press().await.unwrap();

        assert_eq!(source.next_edge().await.unwrap(), Edge::Rising);
        assert_eq!(source.next_edge().await.unwrap(), Edge::Falling);
    }

    #[tokio::test]
    async fn test_dropped_handle_disconnects() {
        let (mut source, handle) = MockEdgeSource::new("door sensor");
        drop(handle);

        let error = source.next_edge().await.unwrap_err();
        assert!(matches!(error, HardwareError::Disconnected { .. }));
    }
}
