//! Call envelopes and the CallBus
//!
//! Every outbound [`RemoteCall`] travels inside a [`CallEnvelope`] stamped
//! with the session it belongs to and a per-session sequence number. The
//! [`CallBus`] fans envelopes out to every connected remote UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::protocol::RemoteCall;

/// Outbound call plus delivery metadata
///
/// `seq` increases by one per call sent through a transport. UIDs are only
/// meaningful within one `session_id`; a remote that observes a new session
/// id must discard its mirrored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEnvelope {
    pub session_id: Uuid,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub call: RemoteCall,
}

impl CallEnvelope {
    pub fn new(session_id: Uuid, seq: u64, call: RemoteCall) -> Self {
        Self {
            session_id,
            seq,
            timestamp: Utc::now(),
            call,
        }
    }

    /// Protocol method of the wrapped call
    pub fn method(&self) -> &'static str {
        self.call.method()
    }
}

/// Broadcast bus for call envelopes
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow remotes never stall the bridge)
/// - Multiple concurrent subscribers (one per connected UI)
/// - Lagged subscribers lose the oldest envelopes
///
/// # Examples
///
/// ```
/// use mirror_common::events::{CallBus, CallEnvelope};
/// use mirror_common::protocol::{RemoteCall, Uid};
///
/// let bus = CallBus::new(100);
/// let mut rx = bus.subscribe();
///
/// let envelope = CallEnvelope::new(uuid::Uuid::new_v4(), 1, RemoteCall::RemoveTrack { uid: Uid(7) });
/// bus.emit(envelope).ok();
///
/// assert_eq!(rx.try_recv().unwrap().method(), "onRemoveTrack");
/// ```
#[derive(Clone)]
pub struct CallBus {
    tx: broadcast::Sender<CallEnvelope>,
    capacity: usize,
}

impl CallBus {
    /// Creates a new CallBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future envelopes
    ///
    /// Envelopes emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CallEnvelope> {
        self.tx.subscribe()
    }

    /// Emit an envelope to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` (carrying the envelope back) otherwise.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        envelope: CallEnvelope,
    ) -> Result<usize, broadcast::error::SendError<CallEnvelope>> {
        self.tx.send(envelope)
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
