//! Test helpers for mirror-bridge integration tests
//!
//! - Recorder: transport whose pump is drained on demand
//! - LossySink: drops one chosen delivery, as an unreliable remote would
//! - ScriptedHost: PiP host that logs every call and accepts on command
//! - next_envelope: timeout-bounded receive for spawned pumps

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mirror_bridge::pip::PipHost;
use mirror_bridge::transport::{ChannelSink, RemoteSink, Transport, TransportError, TransportPump};
use mirror_common::events::CallEnvelope;
use mirror_common::protocol::RemoteCall;
use mirror_common::PlayerId;
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Transport plus everything its pump delivered
pub struct Recorder {
    pub transport: Transport,
    pump: TransportPump,
    rx: UnboundedReceiver<CallEnvelope>,
}

impl Recorder {
    pub fn new() -> Self {
        let (sink, rx) = ChannelSink::new();
        Self::with_sink(Arc::new(sink), rx)
    }

    /// Recorder whose `nth` delivery (zero-based) of `method` is lost
    pub fn lossy(method: &'static str, nth: usize) -> Self {
        let (sink, rx) = ChannelSink::new();
        let sink = LossySink {
            inner: sink,
            method,
            skip: AtomicUsize::new(nth),
            fired: AtomicBool::new(false),
        };
        Self::with_sink(Arc::new(sink), rx)
    }

    fn with_sink(sink: Arc<dyn RemoteSink>, rx: UnboundedReceiver<CallEnvelope>) -> Self {
        let (transport, pump) = Transport::new(Uuid::new_v4(), sink);
        Self {
            transport,
            pump,
            rx,
        }
    }

    /// Envelopes delivered since the last call
    pub fn envelopes(&mut self) -> Vec<CallEnvelope> {
        self.pump.drain();
        let mut envelopes = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            envelopes.push(envelope);
        }
        envelopes
    }

    pub fn calls(&mut self) -> Vec<RemoteCall> {
        self.envelopes().into_iter().map(|e| e.call).collect()
    }

    pub fn methods(&mut self) -> Vec<&'static str> {
        self.calls().iter().map(RemoteCall::method).collect()
    }
}

/// Sink that loses exactly one delivery of a given method
pub struct LossySink {
    inner: ChannelSink,
    method: &'static str,
    skip: AtomicUsize,
    fired: AtomicBool,
}

impl RemoteSink for LossySink {
    fn deliver(&self, envelope: CallEnvelope) -> Result<(), TransportError> {
        if envelope.method() == self.method && !self.fired.load(Ordering::SeqCst) {
            if self.skip.load(Ordering::SeqCst) == 0 {
                self.fired.store(true, Ordering::SeqCst);
                return Err(TransportError::Closed);
            }
            self.skip.fetch_sub(1, Ordering::SeqCst);
        }
        self.inner.deliver(envelope)
    }
}

/// PiP host recording calls as `"enter:1"`, `"exit:1"`, `"register:1"`, ...
pub struct ScriptedHost {
    accept: AtomicBool,
    log: Mutex<Vec<String>>,
}

impl ScriptedHost {
    pub fn new(accept: bool) -> Arc<Self> {
        Arc::new(Self {
            accept: AtomicBool::new(accept),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::SeqCst);
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, what: &str, player: PlayerId) {
        self.log.lock().unwrap().push(format!("{}:{}", what, player.0));
    }
}

impl PipHost for ScriptedHost {
    fn enter_pip(&self, player: PlayerId) -> bool {
        self.record("enter", player);
        self.accept.load(Ordering::SeqCst)
    }

    fn exit_pip(&self, player: PlayerId) {
        self.record("exit", player);
    }

    fn register_action_receiver(&self, player: PlayerId) {
        self.record("register", player);
    }

    fn unregister_action_receiver(&self, player: PlayerId) {
        self.record("unregister", player);
    }
}

/// Next envelope from a spawned pump, failing the test after [`RECV_TIMEOUT`]
pub async fn next_envelope(rx: &mut UnboundedReceiver<CallEnvelope>) -> CallEnvelope {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a call")
        .expect("transport pump stopped")
}
