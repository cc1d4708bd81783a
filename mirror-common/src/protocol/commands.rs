//! Inbound control calls (remote UI runtime → bridge)

use serde::{Deserialize, Serialize};

use super::payloads::TextTrackMode;
use super::{PlayerId, Uid};

/// Control call issued by the remote runtime
///
/// Entity references are UIDs previously announced by the bridge. A UID the
/// bridge has since released resolves to "not found", never to a crash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum RemoteCommand {
    #[serde(rename = "setEnabled", rename_all = "camelCase")]
    SetEnabled { track_uid: Uid, enabled: bool },

    #[serde(rename = "setTargetQuality", rename_all = "camelCase")]
    SetTargetQuality { track_uid: Uid, quality_uid: Uid },

    #[serde(rename = "setTargetQualities", rename_all = "camelCase")]
    SetTargetQualities { track_uid: Uid, quality_uids: Vec<Uid> },

    #[serde(rename = "setMode", rename_all = "camelCase")]
    SetMode { track_uid: Uid, mode: TextTrackMode },

    #[serde(rename = "enterPip", rename_all = "camelCase")]
    EnterPip { player_id: PlayerId },

    #[serde(rename = "exitPip", rename_all = "camelCase")]
    ExitPip { player_id: PlayerId },
}

impl RemoteCommand {
    /// Protocol method name
    pub fn method(&self) -> &'static str {
        match self {
            RemoteCommand::SetEnabled { .. } => "setEnabled",
            RemoteCommand::SetTargetQuality { .. } => "setTargetQuality",
            RemoteCommand::SetTargetQualities { .. } => "setTargetQualities",
            RemoteCommand::SetMode { .. } => "setMode",
            RemoteCommand::EnterPip { .. } => "enterPip",
            RemoteCommand::ExitPip { .. } => "exitPip",
        }
    }
}

/// Completion result of a control call
///
/// The remote may ignore it; `accepted == false` with a `reason` reports
/// capability and stale-reference failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReply {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CommandReply {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}
