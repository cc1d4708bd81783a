//! Synchronous PiP state machine

use std::sync::Arc;

use mirror_common::config::PipConfig;
use mirror_common::protocol::{PresentationMode, RemoteCall};
use mirror_common::PlayerId;
use tracing::{debug, info, warn};

use super::{PipHost, PipMessage, PipState, PipStatus, PlayerDirectory, ACTION_PAUSE, ACTION_PLAY};
use crate::engine::EngineCommand;
use crate::transport::Transport;

/// Owner of the single PiP slot
///
/// Not thread-safe by itself; the [`PipController`](super::PipController)
/// feeds it one message at a time.
pub struct PipMachine {
    host: Arc<dyn PipHost>,
    transport: Transport,
    config: PipConfig,
    players: PlayerDirectory,
    state: PipState,
    slot: Option<PlayerId>,
    /// Player whose transient action receiver is registered with the host
    receiver: Option<PlayerId>,
}

impl PipMachine {
    pub fn new(host: Arc<dyn PipHost>, transport: Transport, config: PipConfig) -> Self {
        Self {
            host,
            transport,
            config,
            players: PlayerDirectory::new(),
            state: PipState::Idle,
            slot: None,
            receiver: None,
        }
    }

    pub fn status(&self) -> PipStatus {
        PipStatus {
            state: self.state,
            active_player: self.slot,
        }
    }

    pub fn players(&self) -> &PlayerDirectory {
        &self.players
    }

    /// React to one message
    ///
    /// Returns whether the message had an effect. For `Enter` this is the
    /// result reported to the caller: `false` when PiP is disabled, the
    /// player is unknown or not capable, the slot is taken by another player,
    /// or the host refused.
    pub fn handle(&mut self, message: PipMessage) -> bool {
        debug!("PiP {} in state {}", message.name(), self.state);
        match message {
            PipMessage::UserLeaveHint => self.on_user_leave_hint(),
            PipMessage::ConfigurationChanged { in_pip } => self.on_configuration_changed(in_pip),
            PipMessage::Action { code } => self.on_action(code),
            PipMessage::Enter { player } => self.enter(player),
            PipMessage::Exit { player } => self.exit(player),
            PipMessage::PlayerAdded {
                player,
                engine,
                pip_capable,
            } => {
                self.players.register(player, engine, pip_capable);
                true
            }
            PipMessage::PlayerRemoved { player } => {
                if self.slot == Some(player) {
                    self.exit(player);
                }
                self.players.unregister(player).is_some()
            }
        }
    }

    fn on_user_leave_hint(&mut self) -> bool {
        if !self.config.enabled || !self.config.auto_enter_on_user_leave {
            return false;
        }
        if self.state != PipState::Idle {
            return false;
        }
        match self.players.eligible().as_slice() {
            [player] => self.enter(*player),
            eligible => {
                debug!(
                    "User leaving with {} eligible players, not entering PiP",
                    eligible.len()
                );
                false
            }
        }
    }

    fn enter(&mut self, player: PlayerId) -> bool {
        if !self.config.enabled {
            debug!("PiP disabled, refusing {}", player);
            return false;
        }
        match self.players.get(player) {
            Some(entry) if entry.pip_capable => {}
            Some(_) => {
                debug!("{} is not PiP-capable", player);
                return false;
            }
            None => {
                warn!("PiP requested for unknown {}", player);
                return false;
            }
        }
        if let Some(holder) = self.slot {
            // Re-entering with the current holder changes nothing
            let same = holder == player && self.state == PipState::Active;
            if !same {
                debug!("PiP slot held by {}, rejecting {}", holder, player);
            }
            return same;
        }

        self.transition(PipState::Entering);
        self.slot = Some(player);
        self.host.register_action_receiver(player);
        self.receiver = Some(player);

        if self.host.enter_pip(player) {
            self.transition(PipState::Active);
            info!("{} entered PiP", player);
            self.notify(player, PresentationMode::PictureInPicture, PresentationMode::Inline);
            true
        } else {
            info!("Host refused PiP for {}", player);
            self.release_slot();
            false
        }
    }

    /// Always succeeds locally; the host is not asked to confirm
    fn exit(&mut self, player: PlayerId) -> bool {
        if self.slot != Some(player) {
            debug!("{} does not hold the PiP slot", player);
            return true;
        }
        self.transition(PipState::Exiting);
        self.host.exit_pip(player);
        self.release_slot();
        info!("{} exited PiP", player);
        self.notify(player, PresentationMode::Inline, PresentationMode::PictureInPicture);
        true
    }

    fn on_configuration_changed(&mut self, in_pip: bool) -> bool {
        match (self.state, in_pip) {
            (PipState::Active, false) => {
                let Some(player) = self.slot else {
                    return false;
                };
                info!("Host left PiP for {}", player);
                self.release_slot();
                self.notify(player, PresentationMode::Inline, PresentationMode::PictureInPicture);
                true
            }
            (PipState::Idle, true) => {
                debug!("Host reports PiP without a slot holder, ignoring");
                false
            }
            _ => false,
        }
    }

    fn on_action(&mut self, code: i32) -> bool {
        let Some(player) = self.receiver else {
            debug!("PiP action {} with no receiver registered", code);
            return false;
        };
        let command = match code {
            ACTION_PLAY => EngineCommand::Play,
            ACTION_PAUSE => EngineCommand::Pause,
            other => {
                debug!("Unknown PiP action code {}", other);
                return false;
            }
        };
        let Some(entry) = self.players.get(player) else {
            return false;
        };
        match entry.engine.submit(command) {
            Ok(()) => true,
            Err(e) => {
                warn!("PiP action for {} not applied: {}", player, e);
                false
            }
        }
    }

    /// Tear down the transient receiver and clear the slot
    fn release_slot(&mut self) {
        if let Some(player) = self.receiver.take() {
            self.host.unregister_action_receiver(player);
        }
        self.slot = None;
        self.transition(PipState::Idle);
    }

    fn transition(&mut self, next: PipState) {
        debug!("PiP {} -> {}", self.state, next);
        self.state = next;
    }

    fn notify(&self, player: PlayerId, mode: PresentationMode, previous: PresentationMode) {
        self.transport.send(RemoteCall::PresentationModeChange {
            player_id: player,
            presentation_mode: mode,
            previous_presentation_mode: previous,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineLoop, Player};
    use crate::forwarder::test_support::Harness;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedHost {
        refuse: AtomicBool,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedHost {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl PipHost for ScriptedHost {
        fn enter_pip(&self, player: PlayerId) -> bool {
            self.log.lock().unwrap().push(format!("enter {}", player.0));
            !self.refuse.load(Ordering::SeqCst)
        }

        fn exit_pip(&self, player: PlayerId) {
            self.log.lock().unwrap().push(format!("exit {}", player.0));
        }

        fn register_action_receiver(&self, player: PlayerId) {
            self.log.lock().unwrap().push(format!("register {}", player.0));
        }

        fn unregister_action_receiver(&self, player: PlayerId) {
            self.log.lock().unwrap().push(format!("unregister {}", player.0));
        }
    }

    struct Fixture {
        harness: Harness,
        host: Arc<ScriptedHost>,
        machine: PipMachine,
        engines: Vec<(Arc<Player>, EngineLoop)>,
    }

    fn fixture(capable: &[bool]) -> Fixture {
        let harness = Harness::new();
        let host = Arc::new(ScriptedHost::default());
        let mut machine = PipMachine::new(
            host.clone(),
            harness.ctx.transport.clone(),
            PipConfig::default(),
        );
        let mut engines = Vec::new();
        for (i, pip_capable) in capable.iter().enumerate() {
            let player = Arc::new(Player::new(PlayerId(i as u32 + 1)).with_pip_capable(*pip_capable));
            let (engine, engine_loop) = EngineLoop::new(player.clone());
            machine.handle(PipMessage::PlayerAdded {
                player: player.id(),
                engine,
                pip_capable: *pip_capable,
            });
            engines.push((player, engine_loop));
        }
        Fixture {
            harness,
            host,
            machine,
            engines,
        }
    }

    #[test]
    fn test_second_enter_rejected_without_host_contact() {
        let mut f = fixture(&[true, true]);

        assert!(f.machine.handle(PipMessage::Enter { player: PlayerId(1) }));
        assert_eq!(f.machine.status().state, PipState::Active);
        assert!(!f.machine.handle(PipMessage::Enter { player: PlayerId(2) }));

        assert_eq!(f.host.log(), vec!["register 1", "enter 1"]);
        assert_eq!(f.machine.status().active_player, Some(PlayerId(1)));
    }

    #[test]
    fn test_host_refusal_reverts_and_unregisters() {
        let mut f = fixture(&[true]);
        f.host.refuse.store(true, Ordering::SeqCst);

        assert!(!f.machine.handle(PipMessage::Enter { player: PlayerId(1) }));
        assert_eq!(f.machine.status().state, PipState::Idle);
        assert_eq!(f.host.log(), vec!["register 1", "enter 1", "unregister 1"]);
        assert!(f.harness.calls().is_empty());
    }

    #[test]
    fn test_user_leave_requires_exactly_one_eligible_player() {
        let mut two = fixture(&[true, true]);
        assert!(!two.machine.handle(PipMessage::UserLeaveHint));
        assert!(two.host.log().is_empty());

        let mut one = fixture(&[false, true]);
        assert!(one.machine.handle(PipMessage::UserLeaveHint));
        assert_eq!(one.machine.status().active_player, Some(PlayerId(2)));
    }

    #[test]
    fn test_host_forced_exit_notifies_once() {
        let mut f = fixture(&[true]);
        f.machine.handle(PipMessage::Enter { player: PlayerId(1) });
        f.harness.calls();

        assert!(f.machine.handle(PipMessage::ConfigurationChanged { in_pip: false }));
        assert!(!f.machine.handle(PipMessage::ConfigurationChanged { in_pip: false }));

        assert_eq!(f.machine.status().state, PipState::Idle);
        assert_eq!(
            f.harness.calls(),
            vec![RemoteCall::PresentationModeChange {
                player_id: PlayerId(1),
                presentation_mode: PresentationMode::Inline,
                previous_presentation_mode: PresentationMode::PictureInPicture,
            }]
        );
        assert_eq!(f.host.log().last().unwrap(), "unregister 1");
    }

    #[test]
    fn test_actions_are_marshalled_to_engine() {
        let mut f = fixture(&[true]);
        assert!(!f.machine.handle(PipMessage::Action { code: ACTION_PLAY }));

        f.machine.handle(PipMessage::Enter { player: PlayerId(1) });
        assert!(f.machine.handle(PipMessage::Action { code: ACTION_PLAY }));
        assert!(!f.machine.handle(PipMessage::Action { code: 99 }));

        let (player, engine_loop) = &mut f.engines[0];
        assert!(player.is_paused(), "not applied on the host thread");
        assert_eq!(engine_loop.drain(), 1);
        assert!(!player.is_paused());
    }

    #[test]
    fn test_explicit_exit_and_removed_holder() {
        let mut f = fixture(&[true]);
        f.machine.handle(PipMessage::Enter { player: PlayerId(1) });
        assert!(f.machine.handle(PipMessage::Exit { player: PlayerId(1) }));
        assert!(f.machine.handle(PipMessage::Exit { player: PlayerId(1) }));
        assert_eq!(
            f.harness.methods(),
            vec!["onPresentationModeChange", "onPresentationModeChange"]
        );

        f.machine.handle(PipMessage::Enter { player: PlayerId(1) });
        assert!(f.machine.handle(PipMessage::PlayerRemoved { player: PlayerId(1) }));
        assert_eq!(f.machine.status().state, PipState::Idle);
        assert!(f.machine.players().is_empty());
    }
}
