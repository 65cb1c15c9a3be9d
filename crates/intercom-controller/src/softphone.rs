//! Calling engine seam.

use std::future::Future;

use intercom_network::{ClientError, ControlClient};
use intercom_protocol::Command;

/// The commands the controller issues to the calling engine.
///
/// Implemented by [`ControlClient`]; tests use
/// [`MockSoftphone`](crate::mock::MockSoftphone).
pub trait Softphone: Send + Sync {
    fn dial(&self, number: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn hangup(&self) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn play(&self, file: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl Softphone for ControlClient {
    async fn dial(&self, number: &str) -> Result<(), ClientError> {
        self.send(Command::dial(number)).await
    }

    async fn hangup(&self) -> Result<(), ClientError> {
        self.send(Command::hangup()).await
    }

    async fn play(&self, file: &str) -> Result<(), ClientError> {
        self.send(Command::play(file)).await
    }
}
