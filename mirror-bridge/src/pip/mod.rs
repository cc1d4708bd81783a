//! Picture-in-picture coordination
//!
//! The host platform reports lifecycle signals (user leaving, configuration
//! changed, media actions) as [`PipMessage`]s. A [`PipMachine`] reacts to them
//! one at a time, owning the single PiP slot:
//!
//! ```text
//! Idle ──enter──> Entering ──host accepts──> Active ──exit──> Exiting ──> Idle
//!                    │                          │
//!                    └──host rejects──> Idle    └──host reports not in PiP──> Idle
//! ```
//!
//! The host is the source of truth. Whatever the machine believes, a
//! configuration change reporting "not in PiP" brings it back to `Idle`.

mod controller;
mod directory;
mod host;
mod machine;

pub use controller::PipController;
pub use directory::{PlayerDirectory, PlayerEntry};
pub use host::{HeadlessHost, PipHost};
pub use machine::PipMachine;

use mirror_common::PlayerId;
use serde::Serialize;

use crate::engine::EngineHandle;

/// Media action code: resume playback
pub const ACTION_PLAY: i32 = 1;
/// Media action code: pause playback
pub const ACTION_PAUSE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipState {
    Idle,
    Entering,
    Active,
    Exiting,
}

impl std::fmt::Display for PipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipState::Idle => write!(f, "idle"),
            PipState::Entering => write!(f, "entering"),
            PipState::Active => write!(f, "active"),
            PipState::Exiting => write!(f, "exiting"),
        }
    }
}

/// Observable PiP state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipStatus {
    pub state: PipState,
    pub active_player: Option<PlayerId>,
}

/// Input to the PiP state machine
pub enum PipMessage {
    /// Host: the user is leaving the app (backgrounding)
    UserLeaveHint,
    /// Host: configuration changed; `in_pip` is the actual host state
    ConfigurationChanged { in_pip: bool },
    /// Host: media action from the PiP window controls
    Action { code: i32 },
    Enter { player: PlayerId },
    Exit { player: PlayerId },
    PlayerAdded {
        player: PlayerId,
        engine: EngineHandle,
        pip_capable: bool,
    },
    PlayerRemoved { player: PlayerId },
}

impl PipMessage {
    pub fn name(&self) -> &'static str {
        match self {
            PipMessage::UserLeaveHint => "user_leave_hint",
            PipMessage::ConfigurationChanged { .. } => "configuration_changed",
            PipMessage::Action { .. } => "action",
            PipMessage::Enter { .. } => "enter",
            PipMessage::Exit { .. } => "exit",
            PipMessage::PlayerAdded { .. } => "player_added",
            PipMessage::PlayerRemoved { .. } => "player_removed",
        }
    }
}
