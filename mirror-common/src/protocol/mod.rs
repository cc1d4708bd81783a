//! Cross-runtime wire protocol
//!
//! The bridge speaks a fixed, one-directional call surface towards the remote
//! UI runtime ([`RemoteCall`]) and accepts a small set of control calls back
//! ([`RemoteCommand`]). Field and method names are part of the interop
//! contract and must not change.

mod calls;
mod commands;
mod payloads;

pub use calls::{AdBreakEventType, AdEventType, RemoteCall};
pub use commands::{CommandReply, RemoteCommand};
pub use payloads::{
    AdBreakCall, AdBreakPayload, AdCall, AdPayload, AdsSnapshot, PresentationMode, QualityPayload,
    TextTrackMode, TextTrackPayload, TrackPayload,
};

use serde::{Deserialize, Serialize};

/// Process-local stable identifier of a mirrored entity
///
/// The only identifier that is safe to use across the runtime boundary;
/// human-readable `id` fields are not guaranteed unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub u64);

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a player instance hosted by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player-{}", self.0)
    }
}
