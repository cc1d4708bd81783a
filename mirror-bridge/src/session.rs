//! Mirror session
//!
//! One session mirrors one player into one remote runtime: it owns the UID
//! registry, the forwarders for every entity category, and the resolution
//! of remote control commands back into engine intents.

use std::sync::{Arc, Mutex};

use mirror_common::protocol::{CommandReply, RemoteCommand};
use mirror_common::PlayerId;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::{EngineCommand, EngineHandle, Player};
use crate::error::{Error, Result};
use crate::forwarder::{
    AdBreakForwarder, AdForwarder, ForwarderContext, MediaTrackForwarder, TextTrackForwarder,
};
use crate::lock::lock;
use crate::registry::EntityRegistry;
use crate::transport::Transport;

/// Forwarders in attach order; detached in reverse
struct Forwarders {
    audio: MediaTrackForwarder,
    video: MediaTrackForwarder,
    text: TextTrackForwarder,
    ad_breaks: AdBreakForwarder,
    ads: AdForwarder,
}

impl Forwarders {
    fn detach(self) {
        self.ads.detach();
        self.ad_breaks.detach();
        self.text.detach();
        self.video.detach();
        self.audio.detach();
    }
}

pub struct MirrorSession {
    player: Arc<Player>,
    engine: EngineHandle,
    ctx: ForwarderContext,
    forwarders: Mutex<Option<Forwarders>>,
}

impl MirrorSession {
    /// Start mirroring `player`; existing entities are announced right away
    pub fn attach(player: Arc<Player>, engine: EngineHandle, transport: Transport) -> Self {
        let ctx = ForwarderContext::new(Arc::new(EntityRegistry::new()), transport);
        info!(
            "Attaching session {} to {}",
            ctx.transport.session_id(),
            player.id()
        );

        // Ad breaks before ads, so every ad's break is known when it is announced
        let forwarders = Forwarders {
            audio: MediaTrackForwarder::attach(player.audio_tracks(), ctx.clone()),
            video: MediaTrackForwarder::attach(player.video_tracks(), ctx.clone()),
            text: TextTrackForwarder::attach(player.text_tracks(), ctx.clone()),
            ad_breaks: AdBreakForwarder::attach(&player, ctx.clone()),
            ads: AdForwarder::attach(&player, ctx.clone()),
        };

        Self {
            player,
            engine,
            ctx,
            forwarders: Mutex::new(Some(forwarders)),
        }
    }

    /// Stop mirroring and forget every UID; further calls are no-ops
    pub fn detach(&self) {
        let Some(forwarders) = lock(&self.forwarders).take() else {
            return;
        };
        forwarders.detach();
        let released = self.ctx.registry.clear();
        info!(
            "Detached session {} ({} entities released)",
            self.session_id(),
            released
        );
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.forwarders).is_some()
    }

    pub fn session_id(&self) -> Uuid {
        self.ctx.transport.session_id()
    }

    pub fn player_id(&self) -> PlayerId {
        self.player.id()
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.ctx.registry
    }

    pub fn transport(&self) -> &Transport {
        &self.ctx.transport
    }

    /// Resolve a remote command and queue its intent on the engine
    ///
    /// Stale UIDs yield [`Error::NotFound`]; UIDs naming the wrong kind of
    /// entity yield [`Error::InvalidInput`]. PiP commands belong to the PiP
    /// controller and are rejected here.
    pub fn handle_command(&self, command: RemoteCommand) -> Result<CommandReply> {
        let method = command.method();
        debug!("Command {}", method);
        let registry = &self.ctx.registry;
        let intent = match command {
            RemoteCommand::SetEnabled { track_uid, enabled } => EngineCommand::SetTrackEnabled {
                track: registry.resolve_media_track(track_uid)?,
                enabled,
            },
            RemoteCommand::SetTargetQuality {
                track_uid,
                quality_uid,
            } => EngineCommand::SetTargetQualities {
                track: registry.resolve_media_track(track_uid)?,
                qualities: vec![registry.resolve_quality(track_uid, quality_uid)?],
            },
            RemoteCommand::SetTargetQualities {
                track_uid,
                quality_uids,
            } => EngineCommand::SetTargetQualities {
                track: registry.resolve_media_track(track_uid)?,
                qualities: quality_uids
                    .into_iter()
                    .map(|quality_uid| registry.resolve_quality(track_uid, quality_uid))
                    .collect::<Result<Vec<_>>>()?,
            },
            RemoteCommand::SetMode { track_uid, mode } => EngineCommand::SetTextTrackMode {
                track: registry.resolve_text_track(track_uid)?,
                mode,
            },
            RemoteCommand::EnterPip { .. } | RemoteCommand::ExitPip { .. } => {
                return Err(Error::InvalidInput(format!(
                    "{} is not a session command",
                    method
                )));
            }
        };
        self.engine.submit(intent)?;
        Ok(CommandReply::accepted())
    }
}

impl Drop for MirrorSession {
    fn drop(&mut self) {
        self.detach();
    }
}
