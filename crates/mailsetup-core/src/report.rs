//! Delivery of provisioning results.
//!
//! A result goes out exactly once, either on the process-wide broadcast
//! channel or to the sink the caller handed in with its request.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::provision::ProvisioningResult;

/// Receives the result of a request on behalf of the caller that sent it.
pub trait ResultSink: Send + Sync {
    /// Delivers the terminal result.
    fn deliver(&self, result: &ProvisioningResult);
}

/// How a request wants its result delivered.
#[derive(Clone, Default)]
pub enum ReplyMode {
    /// Publish to every broadcast listener.
    #[default]
    Broadcast,
    /// Deliver only to the caller's sink.
    Targeted(Arc<dyn ResultSink>),
}

impl ReplyMode {
    /// Targeted delivery to `sink`.
    pub fn targeted(sink: impl ResultSink + 'static) -> Self {
        Self::Targeted(Arc::new(sink))
    }
}

impl std::fmt::Debug for ReplyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Broadcast => f.write_str("Broadcast"),
            Self::Targeted(_) => f.write_str("Targeted(..)"),
        }
    }
}

/// A [`ResultSink`] that forwards results into a tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProvisioningResult>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its results arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProvisioningResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, result: &ProvisioningResult) {
        if self.tx.send(result.clone()).is_err() {
            debug!("Reply channel for {} already closed", result.email);
        }
    }
}

/// Which channel a result went out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Broadcast, with the number of listeners that received it.
    Broadcast {
        /// Active listeners at send time.
        listeners: usize,
    },
    /// Handed to the caller's sink.
    Targeted,
}

/// Dispatches results through the channel each request selected.
#[derive(Debug, Clone)]
pub struct ResultReporter {
    broadcast: broadcast::Sender<ProvisioningResult>,
}

impl ResultReporter {
    /// Creates a reporter whose broadcast channel buffers `capacity` results.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (broadcast, _) = broadcast::channel(capacity.max(1));
        Self { broadcast }
    }

    /// Listens to broadcast results.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningResult> {
        self.broadcast.subscribe()
    }

    /// Delivers `result` through `reply`.
    pub fn report(&self, result: &ProvisioningResult, reply: &ReplyMode) -> Delivery {
        match reply {
            ReplyMode::Broadcast => {
                // No listeners is not an error; the result is simply dropped.
                let listeners = self.broadcast.send(result.clone()).unwrap_or(0);
                debug!(
                    "Broadcast result for {} to {listeners} listener(s)",
                    result.email
                );
                Delivery::Broadcast { listeners }
            }
            ReplyMode::Targeted(sink) => {
                sink.deliver(result);
                debug!("Delivered result for {} to caller", result.email);
                Delivery::Targeted
            }
        }
    }
}
