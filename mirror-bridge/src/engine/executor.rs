//! Marshalling of control intents onto the engine's own thread
//!
//! Remote commands and PiP media actions arrive on foreign threads (HTTP
//! workers, host callbacks). They never touch engine state directly; they are
//! queued as [`EngineCommand`]s and applied by the [`EngineLoop`] running in
//! the engine's execution context.

use std::sync::Arc;
use std::thread::JoinHandle;

use mirror_common::protocol::TextTrackMode;
use mirror_common::PlayerId;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::player::Player;
use super::text_track::TextTrack;
use super::track::{MediaTrack, Quality};
use crate::error::{Error, Result};

/// Intent to be applied to a player on its engine thread
pub enum EngineCommand {
    Play,
    Pause,
    SetTrackEnabled {
        track: Arc<MediaTrack>,
        enabled: bool,
    },
    SetTargetQualities {
        track: Arc<MediaTrack>,
        qualities: Vec<Arc<Quality>>,
    },
    SetTextTrackMode {
        track: Arc<TextTrack>,
        mode: TextTrackMode,
    },
}

impl EngineCommand {
    fn name(&self) -> &'static str {
        match self {
            EngineCommand::Play => "play",
            EngineCommand::Pause => "pause",
            EngineCommand::SetTrackEnabled { .. } => "set_track_enabled",
            EngineCommand::SetTargetQualities { .. } => "set_target_qualities",
            EngineCommand::SetTextTrackMode { .. } => "set_text_track_mode",
        }
    }
}

/// Cloneable sender side of a player's engine loop
#[derive(Clone)]
pub struct EngineHandle {
    player_id: PlayerId,
    tx: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Queue a command without blocking the caller
    pub fn submit(&self, command: EngineCommand) -> Result<()> {
        debug!("{}: queue {}", self.player_id, command.name());
        self.tx.send(command).map_err(|_| Error::EngineUnavailable)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiver side, owned by the engine's execution context
pub struct EngineLoop {
    player: Arc<Player>,
    rx: mpsc::UnboundedReceiver<EngineCommand>,
}

impl EngineLoop {
    pub fn new(player: Arc<Player>) -> (EngineHandle, EngineLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = EngineHandle {
            player_id: player.id(),
            tx,
        };
        (handle, EngineLoop { player, rx })
    }

    /// Apply every command queued so far; returns how many were applied
    ///
    /// For embedders that pump the engine from their own event loop.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.rx.try_recv() {
            apply(&self.player, command);
            applied += 1;
        }
        applied
    }

    /// Apply commands until every handle is dropped
    ///
    /// Blocks the calling thread; must not run inside an async task.
    pub fn run_blocking(mut self) {
        while let Some(command) = self.rx.blocking_recv() {
            apply(&self.player, command);
        }
        info!("{}: engine loop stopped", self.player.id());
    }

    /// Run the loop on a dedicated engine thread
    pub fn spawn_thread(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name(format!("engine-{}", self.player.id().0))
            .spawn(move || self.run_blocking())
    }
}

fn apply(player: &Player, command: EngineCommand) {
    match command {
        EngineCommand::Play => player.play(),
        EngineCommand::Pause => player.pause(),
        EngineCommand::SetTrackEnabled { track, enabled } => {
            player.set_track_enabled(&track, enabled)
        }
        EngineCommand::SetTargetQualities { track, qualities } => {
            player.set_target_qualities(&track, qualities)
        }
        EngineCommand::SetTextTrackMode { track, mode } => player.set_text_track_mode(&track, mode),
    }
}
