//! Actor task owning the PiP machine
//!
//! Host callbacks, HTTP handlers and remote commands all talk to the machine
//! through one mailbox, so every message is handled in arrival order and no
//! two callers ever see a half-applied transition.

use mirror_common::PlayerId;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{PipMachine, PipMessage, PipStatus};
use crate::error::{Error, Result};

enum Request {
    Post(PipMessage),
    Call {
        message: PipMessage,
        reply: oneshot::Sender<bool>,
    },
}

/// Cloneable handle to the PiP actor
#[derive(Clone)]
pub struct PipController {
    tx: mpsc::UnboundedSender<Request>,
    status: watch::Receiver<PipStatus>,
}

impl PipController {
    /// Move the machine into its own task
    pub fn spawn(mut machine: PipMachine) -> (PipController, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Request>();
        let (status_tx, status) = watch::channel(machine.status());

        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let (message, reply) = match request {
                    Request::Post(message) => (message, None),
                    Request::Call { message, reply } => (message, Some(reply)),
                };
                let result = machine.handle(message);
                // Status is published before the reply is sent
                status_tx.send_if_modified(|current| {
                    let next = machine.status();
                    let changed = *current != next;
                    *current = next;
                    changed
                });
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            info!("PiP controller stopped");
        });

        (PipController { tx, status }, task)
    }

    /// Queue a message without waiting; safe to call from host callback threads
    pub fn post(&self, message: PipMessage) -> Result<()> {
        self.tx
            .send(Request::Post(message))
            .map_err(|_| Error::PipStopped)
    }

    /// Request PiP for `player`; `Ok(false)` when refused
    pub async fn enter_pip(&self, player: PlayerId) -> Result<bool> {
        self.call(PipMessage::Enter { player }).await
    }

    pub async fn exit_pip(&self, player: PlayerId) -> Result<()> {
        self.call(PipMessage::Exit { player }).await.map(|_| ())
    }

    /// Handle a host signal and return the status it left behind
    pub async fn signal(&self, message: PipMessage) -> Result<PipStatus> {
        self.call(message).await?;
        Ok(self.status())
    }

    pub fn status(&self) -> PipStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change
    pub fn watch(&self) -> watch::Receiver<PipStatus> {
        self.status.clone()
    }

    async fn call(&self, message: PipMessage) -> Result<bool> {
        debug!("PiP call {}", message.name());
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Request::Call { message, reply })
            .map_err(|_| Error::PipStopped)?;
        response.await.map_err(|_| Error::PipStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineLoop, Player};
    use crate::forwarder::test_support::Harness;
    use crate::pip::{HeadlessHost, PipState};
    use mirror_common::config::PipConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_concurrent_enters_have_one_winner() {
        let harness = Harness::new();
        let machine = PipMachine::new(
            Arc::new(HeadlessHost::default()),
            harness.ctx.transport.clone(),
            PipConfig::default(),
        );
        let (controller, _task) = PipController::spawn(machine);

        let mut loops = Vec::new();
        for id in [1, 2] {
            let player = Arc::new(Player::new(PlayerId(id)).with_pip_capable(true));
            let (engine, engine_loop) = EngineLoop::new(player);
            controller
                .post(PipMessage::PlayerAdded {
                    player: PlayerId(id),
                    engine,
                    pip_capable: true,
                })
                .unwrap();
            loops.push(engine_loop);
        }

        let (a, b) = tokio::join!(
            controller.enter_pip(PlayerId(1)),
            controller.enter_pip(PlayerId(2))
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a ^ b, "exactly one enter must win: {} {}", a, b);
        assert_eq!(controller.status().state, PipState::Active);

        controller.exit_pip(PlayerId(if a { 1 } else { 2 })).await.unwrap();
        assert_eq!(controller.status().state, PipState::Idle);
    }

    #[tokio::test]
    async fn test_stopped_controller_reports_error() {
        let harness = Harness::new();
        let machine = PipMachine::new(
            Arc::new(HeadlessHost::default()),
            harness.ctx.transport.clone(),
            PipConfig::default(),
        );
        let (controller, task) = PipController::spawn(machine);
        task.abort();
        let _ = task.await;

        assert!(matches!(
            controller.enter_pip(PlayerId(1)).await,
            Err(Error::PipStopped)
        ));
    }
}
