//! Delivery targets for the transport pump

use mirror_common::events::{CallBus, CallEnvelope};
use thiserror::Error;
use tokio::sync::mpsc;

/// Why an envelope could not be handed to the remote
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No remote UI is connected to receive the call
    #[error("no remote connected")]
    NoSubscribers,

    /// The receiving end has gone away
    #[error("remote channel closed")]
    Closed,
}

/// Where the pump hands envelopes over to the remote runtime
pub trait RemoteSink: Send + Sync + 'static {
    fn deliver(&self, envelope: CallEnvelope) -> Result<(), TransportError>;
}

/// Broadcasts envelopes to every SSE client subscribed to a [`CallBus`]
pub struct BusSink {
    bus: CallBus,
}

impl BusSink {
    pub fn new(bus: CallBus) -> Self {
        Self { bus }
    }
}

impl RemoteSink for BusSink {
    fn deliver(&self, envelope: CallEnvelope) -> Result<(), TransportError> {
        self.bus
            .emit(envelope)
            .map(|_| ())
            .map_err(|_| TransportError::NoSubscribers)
    }
}

/// Forwards envelopes into an mpsc channel owned by an embedder
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CallEnvelope>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RemoteSink for ChannelSink {
    fn deliver(&self, envelope: CallEnvelope) -> Result<(), TransportError> {
        self.tx.send(envelope).map_err(|_| TransportError::Closed)
    }
}
