//! Media Mirror Bridge (mirror-bridge) - Main entry point
//!
//! Hosts one demo player, mirrors it over SSE and accepts control calls
//! and PiP requests over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mirror_common::config::{load_config, CONFIG_ENV_VAR};
use mirror_common::events::CallBus;
use mirror_common::protocol::TextTrackMode;
use mirror_common::PlayerId;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use mirror_bridge::api::{self, AppContext};
use mirror_bridge::engine::{
    Ad, AdBreak, EngineLoop, MediaTrack, MediaType, Player, Quality, TextTrack,
};
use mirror_bridge::pip::{HeadlessHost, PipController, PipMachine, PipMessage};
use mirror_bridge::transport::{BusSink, Transport};
use mirror_bridge::MirrorSession;

/// Command-line arguments for mirror-bridge
#[derive(Parser, Debug)]
#[command(name = "mirror-bridge")]
#[command(about = "Mirrors native player state into a remote UI runtime")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "MIRROR_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load config")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Initialize tracing
    let default_filter = format!(
        "mirror_bridge={level},mirror_common={level},tower_http=debug",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Media Mirror Bridge on {}:{}",
        config.server.bind_addr, config.server.port
    );

    // Transport: pump task delivering to every connected SSE client
    let bus = CallBus::new(config.transport.bus_capacity);
    let sink = Arc::new(BusSink::new(bus.clone()));
    let (transport, _pump) = Transport::spawn(Uuid::new_v4(), sink);
    info!("Session id {}", transport.session_id());

    // Engine
    let player = Arc::new(Player::new(PlayerId(1)).with_pip_capable(true));
    let (engine, engine_loop) = EngineLoop::new(player.clone());
    engine_loop
        .spawn_thread()
        .context("Failed to start engine thread")?;

    let session = Arc::new(MirrorSession::attach(
        player.clone(),
        engine.clone(),
        transport.clone(),
    ));

    // PiP
    let machine = PipMachine::new(
        Arc::new(HeadlessHost::default()),
        transport.clone(),
        config.pip.clone(),
    );
    let (pip, _pip_task) = PipController::spawn(machine);
    pip.post(PipMessage::PlayerAdded {
        player: player.id(),
        engine,
        pip_capable: player.is_pip_capable(),
    })
    .context("Failed to register player for PiP")?;

    let ctx = AppContext::new(session.clone(), pip, bus);

    // Calls sent before any remote subscribes are dropped, so the demo
    // content is loaded once the first remote is listening
    let remote_connected = ctx.remote_connected.clone();
    tokio::spawn(async move {
        remote_connected.notified().await;
        load_demo_content(&player);
        info!("Demo content loaded into {}", player.id());
    });

    api::run(&config.server, ctx, shutdown_signal())
        .await
        .context("Server error")?;

    session.detach();
    info!("Server shutdown complete");
    Ok(())
}

/// Populate the player with a small fixed set of entities
fn load_demo_content(player: &Player) {
    let video = MediaTrack::new(MediaType::Video, "main", "Main", "")
        .with_qualities(vec![
            Quality::new("360p", "360p", 800_000).with_resolution(640, 360),
            Quality::new("720p", "720p", 2_500_000).with_resolution(1280, 720),
            Quality::new("1080p", "1080p", 5_000_000).with_resolution(1920, 1080),
        ])
        .with_enabled(true);
    player.video_tracks().add(Arc::new(video));

    let audio_tracks = [("en", "English", "en", true), ("fr", "Français", "fr", false)];
    for (id, label, language, enabled) in audio_tracks {
        let audio = MediaTrack::new(MediaType::Audio, id, label, language)
            .with_qualities(vec![Quality::new("aac-128", "AAC 128k", 128_000)])
            .with_enabled(enabled);
        player.audio_tracks().add(Arc::new(audio));
    }

    let subtitles = Arc::new(
        TextTrack::new("subs-en", "English", "en", "subtitles")
            .with_source("webvtt", "subs/en.vtt"),
    );
    subtitles.set_ready_state(2);
    player.text_tracks().add(subtitles.clone());
    player.set_text_track_mode(&subtitles, TextTrackMode::Hidden);

    let forced = TextTrack::new("forced-fr", "Français (forced)", "fr", "subtitles")
        .with_source("webvtt", "subs/fr-forced.vtt")
        .with_forced(true);
    player.text_tracks().add(Arc::new(forced));

    let preroll = Arc::new(AdBreak::new("csai", 0.0).with_max_duration(30.0));
    player.ads().schedule_ad_break(preroll.clone());
    let preroll_ad = Ad::new("preroll-1", "csai")
        .with_duration(15.0)
        .with_skip_offset(5.0);
    player.ads().add_ad(&preroll, Arc::new(preroll_ad));
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
