//! Background provisioning worker.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::outcome::ProvisioningResult;
use super::pipeline::Pipeline;
use super::request::ProvisioningRequest;
use crate::account::AccountStore;
use crate::report::ResultReporter;
use crate::{Error, Result};

/// Runs submitted requests one at a time, in submission order.
///
/// Submission never blocks. Results go out through each request's reply
/// mode.
#[derive(Debug)]
pub struct ProvisioningWorker {
    sender: mpsc::UnboundedSender<ProvisioningRequest>,
    reporter: ResultReporter,
    handle: JoinHandle<()>,
}

impl ProvisioningWorker {
    /// Starts the worker task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn<S: AccountStore + 'static>(pipeline: Pipeline<S>) -> Self {
        let reporter = pipeline.reporter().clone();
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(pipeline, receiver));
        Self {
            sender,
            reporter,
            handle,
        }
    }

    /// Queues a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerClosed`] if the worker task has stopped.
    pub fn submit(&self, request: ProvisioningRequest) -> Result<()> {
        self.sender
            .send(request)
            .map_err(|_| Error::WorkerClosed)
    }

    /// Listens to broadcast results.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningResult> {
        self.reporter.subscribe()
    }

    /// Stops accepting requests and waits for queued ones to finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerClosed`] if the worker task panicked.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.sender);
        self.handle.await.map_err(|e| {
            warn!("Provisioning worker ended abnormally: {e}");
            Error::WorkerClosed
        })
    }
}

async fn run<S: AccountStore>(
    pipeline: Pipeline<S>,
    mut receiver: mpsc::UnboundedReceiver<ProvisioningRequest>,
) {
    debug!("Provisioning worker started");
    while let Some(request) = receiver.recv().await {
        pipeline.run(request).await;
    }
    debug!("Provisioning worker stopped");
}
