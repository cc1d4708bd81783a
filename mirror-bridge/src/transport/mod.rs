//! Fire-and-forget call transport towards the remote runtime
//!
//! [`Transport::send`] is called from engine event listeners. It never blocks
//! and never fails: the call is stamped into a [`CallEnvelope`] and queued on
//! an unbounded channel. A [`TransportPump`] drains the queue in FIFO order
//! and hands each envelope to a [`RemoteSink`].
//!
//! Delivery is at-most-once and best-effort. A failed delivery is logged and
//! dropped; nothing is retried and the sender is never told.

mod sink;

pub use sink::{BusSink, ChannelSink, RemoteSink, TransportError};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mirror_common::events::CallEnvelope;
use mirror_common::protocol::RemoteCall;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::lock::lock;

/// Delivery counters of one transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransportStats {
    /// Calls accepted by `send`
    pub sent: u64,
    /// Envelopes a sink accepted
    pub delivered: u64,
    /// Calls lost to a closed queue or a failed delivery
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TransportStats {
        TransportStats {
            sent: self.sent.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

struct TransportInner {
    session_id: Uuid,
    /// Next sequence number; held while enqueueing so queue order matches `seq`
    next_seq: Mutex<u64>,
    tx: mpsc::UnboundedSender<CallEnvelope>,
    counters: Arc<Counters>,
}

/// Sending side, cheap to clone into listeners
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

impl Transport {
    /// Create a transport and the pump that feeds `sink`
    pub fn new(session_id: Uuid, sink: Arc<dyn RemoteSink>) -> (Transport, TransportPump) {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let transport = Transport {
            inner: Arc::new(TransportInner {
                session_id,
                next_seq: Mutex::new(1),
                tx,
                counters: counters.clone(),
            }),
        };
        let pump = TransportPump { rx, sink, counters };
        (transport, pump)
    }

    /// Create a transport and spawn its pump on the current tokio runtime
    pub fn spawn(session_id: Uuid, sink: Arc<dyn RemoteSink>) -> (Transport, JoinHandle<()>) {
        let (transport, pump) = Self::new(session_id, sink);
        (transport, tokio::spawn(pump.run()))
    }

    /// Queue a call for the remote runtime
    ///
    /// Calls sent from one thread are delivered in the order they were sent.
    pub fn send(&self, call: RemoteCall) {
        let counters = &self.inner.counters;
        counters.sent.fetch_add(1, Ordering::Relaxed);

        let mut next_seq = lock(&self.inner.next_seq);
        let envelope = CallEnvelope::new(self.inner.session_id, *next_seq, call);
        debug!("Queue #{} {}", envelope.seq, envelope.method());
        match self.inner.tx.send(envelope) {
            Ok(()) => *next_seq += 1,
            Err(mpsc::error::SendError(envelope)) => {
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Transport closed, dropped {}", envelope.method());
            }
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn stats(&self) -> TransportStats {
        self.inner.counters.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.tx.is_closed()
    }
}

/// Receiving side of a transport, delivering to one sink
pub struct TransportPump {
    rx: mpsc::UnboundedReceiver<CallEnvelope>,
    sink: Arc<dyn RemoteSink>,
    counters: Arc<Counters>,
}

impl TransportPump {
    /// Deliver envelopes until every [`Transport`] clone is dropped
    pub async fn run(mut self) {
        while let Some(envelope) = self.rx.recv().await {
            self.deliver(envelope);
        }
        info!("Transport pump stopped");
    }

    /// Deliver everything queued so far without waiting; returns the count
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            self.deliver(envelope);
            count += 1;
        }
        count
    }

    fn deliver(&self, envelope: CallEnvelope) {
        let method = envelope.method();
        let seq = envelope.seq;
        match self.sink.deliver(envelope) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(TransportError::NoSubscribers) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("No remote connected, dropped #{} {}", seq, method);
            }
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Delivery of #{} {} failed: {}", seq, method, e);
            }
        }
    }
}
