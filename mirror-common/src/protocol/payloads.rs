//! Payload types carried by protocol calls
//!
//! Every payload is a full attribute snapshot of the entity at the time the
//! call was emitted, never a diff.

use serde::{Deserialize, Serialize};

use super::Uid;

/// Quality (rendition) of a media track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityPayload {
    pub uid: Uid,
    pub id: String,
    pub label: String,
    pub bandwidth: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Audio or video track snapshot (`onAddTrack`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    pub id: String,
    pub uid: Uid,
    pub label: String,
    pub language: String,
    pub kind: String,
    pub enabled: bool,
    pub qualities: Vec<QualityPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_quality: Option<Uid>,
}

/// Text track display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTrackMode {
    Disabled,
    Hidden,
    Showing,
}

impl std::fmt::Display for TextTrackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextTrackMode::Disabled => write!(f, "disabled"),
            TextTrackMode::Hidden => write!(f, "hidden"),
            TextTrackMode::Showing => write!(f, "showing"),
        }
    }
}

/// Text track snapshot (`onAddTextTrack`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTrackPayload {
    pub id: String,
    pub uid: Uid,
    pub label: String,
    pub language: String,
    pub kind: String,
    pub ready_state: u8,
    #[serde(rename = "type")]
    pub track_type: String,
    pub source: String,
    pub forced: bool,
    pub mode: TextTrackMode,
}

/// Single ad snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdPayload {
    pub uid: Uid,
    pub id: String,
    pub integration: String,
    #[serde(rename = "type")]
    pub ad_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_break_uid: Option<Uid>,
}

/// Ad break snapshot, including the ads it currently contains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBreakPayload {
    pub uid: Uid,
    pub integration: String,
    pub time_offset: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
    pub ads: Vec<AdPayload>,
}

/// Full ads state carried redundantly by every ad and ad-break call
///
/// A remote that missed any single call can rebuild its ads view from the
/// next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsSnapshot {
    pub current_ads: Vec<AdPayload>,
    pub current_ad_break: Option<AdBreakPayload>,
    pub scheduled_ads: Vec<AdPayload>,
}

/// Body of every `onAd*` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCall {
    pub ad: AdPayload,
    #[serde(flatten)]
    pub snapshot: AdsSnapshot,
}

/// Body of every `onAdBreak*` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBreakCall {
    pub ad_break: AdBreakPayload,
    #[serde(flatten)]
    pub snapshot: AdsSnapshot,
}

/// Presentation mode reported to the remote for PiP transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationMode {
    Inline,
    PictureInPicture,
}
