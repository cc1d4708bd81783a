//! Outbound calls (bridge → remote UI runtime)

use serde::{Deserialize, Serialize};

use super::payloads::{AdBreakCall, AdCall, PresentationMode, TextTrackMode, TextTrackPayload, TrackPayload};
use super::{PlayerId, Uid};

/// One-directional call towards the remote runtime
///
/// Calls are delivered at most once; none may be assumed acknowledged.
/// Serialized with the method name under `"method"` and camelCase fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum RemoteCall {
    // ---- media tracks ----
    #[serde(rename = "onAddTrack")]
    AddTrack(TrackPayload),

    #[serde(rename = "onRemoveTrack")]
    RemoveTrack { uid: Uid },

    #[serde(rename = "onTrackListChange", rename_all = "camelCase")]
    TrackListChange { uid: Uid, enabled: bool },

    #[serde(rename = "onActiveQualityChanged", rename_all = "camelCase")]
    ActiveQualityChanged { track_uid: Uid, quality_uid: Uid },

    #[serde(rename = "onTargetQualityChanged", rename_all = "camelCase")]
    TargetQualityChanged { track_uid: Uid, quality_uids: Vec<Uid> },

    // ---- text tracks and cues ----
    #[serde(rename = "onAddTextTrack")]
    AddTextTrack(TextTrackPayload),

    #[serde(rename = "onRemoveTextTrack")]
    RemoveTextTrack { uid: Uid },

    #[serde(rename = "onTextTrackListChange")]
    TextTrackListChange { uid: Uid, mode: TextTrackMode },

    #[serde(rename = "onTextTrackAddCue", rename_all = "camelCase")]
    TextTrackAddCue {
        track_uid: Uid,
        cue_id: String,
        cue_uid: Uid,
        start: f64,
        end: f64,
        content: serde_json::Value,
    },

    #[serde(rename = "onTextTrackRemoveCue", rename_all = "camelCase")]
    TextTrackRemoveCue { track_uid: Uid, cue_uid: Uid },

    #[serde(rename = "onTextTrackEnterCue", rename_all = "camelCase")]
    TextTrackEnterCue { track_uid: Uid, cue_uid: Uid },

    #[serde(rename = "onTextTrackExitCue", rename_all = "camelCase")]
    TextTrackExitCue { track_uid: Uid, cue_uid: Uid },

    #[serde(rename = "onTextTrackCueChange", rename_all = "camelCase")]
    TextTrackCueChange { track_uid: Uid },

    #[serde(rename = "onCueEnter", rename_all = "camelCase")]
    CueEnter { track_uid: Uid, cue_uid: Uid },

    #[serde(rename = "onCueExit", rename_all = "camelCase")]
    CueExit { track_uid: Uid, cue_uid: Uid },

    #[serde(rename = "onCueUpdate", rename_all = "camelCase")]
    CueUpdate {
        track_uid: Uid,
        cue_uid: Uid,
        end: f64,
        content: serde_json::Value,
    },

    // ---- ads ----
    #[serde(rename = "onAdBegin")]
    AdBegin(AdCall),
    #[serde(rename = "onAdEnd")]
    AdEnd(AdCall),
    #[serde(rename = "onAdError")]
    AdError(AdCall),
    #[serde(rename = "onAdFirstQuartile")]
    AdFirstQuartile(AdCall),
    #[serde(rename = "onAdMidpoint")]
    AdMidpoint(AdCall),
    #[serde(rename = "onAdThirdQuartile")]
    AdThirdQuartile(AdCall),
    #[serde(rename = "onAdLoaded")]
    AdLoaded(AdCall),
    #[serde(rename = "onAdImpression")]
    AdImpression(AdCall),
    #[serde(rename = "onAdSkip")]
    AdSkip(AdCall),
    #[serde(rename = "onAdTapped")]
    AdTapped(AdCall),
    #[serde(rename = "onAdClicked")]
    AdClicked(AdCall),
    #[serde(rename = "onAddAd")]
    AddAd(AdCall),

    // ---- ad breaks ----
    #[serde(rename = "onAdBreakBegin")]
    AdBreakBegin(AdBreakCall),
    #[serde(rename = "onAdBreakEnd")]
    AdBreakEnd(AdBreakCall),
    #[serde(rename = "onAdBreakChange")]
    AdBreakChange(AdBreakCall),
    #[serde(rename = "onAddAdBreak")]
    AddAdBreak(AdBreakCall),
    #[serde(rename = "onRemoveAdBreak")]
    RemoveAdBreak(AdBreakCall),

    // ---- presentation ----
    #[serde(rename = "onPresentationModeChange", rename_all = "camelCase")]
    PresentationModeChange {
        player_id: PlayerId,
        presentation_mode: PresentationMode,
        previous_presentation_mode: PresentationMode,
    },
}

impl RemoteCall {
    /// Protocol method name, also used as the SSE event name
    pub fn method(&self) -> &'static str {
        match self {
            RemoteCall::AddTrack(_) => "onAddTrack",
            RemoteCall::RemoveTrack { .. } => "onRemoveTrack",
            RemoteCall::TrackListChange { .. } => "onTrackListChange",
            RemoteCall::ActiveQualityChanged { .. } => "onActiveQualityChanged",
            RemoteCall::TargetQualityChanged { .. } => "onTargetQualityChanged",
            RemoteCall::AddTextTrack(_) => "onAddTextTrack",
            RemoteCall::RemoveTextTrack { .. } => "onRemoveTextTrack",
            RemoteCall::TextTrackListChange { .. } => "onTextTrackListChange",
            RemoteCall::TextTrackAddCue { .. } => "onTextTrackAddCue",
            RemoteCall::TextTrackRemoveCue { .. } => "onTextTrackRemoveCue",
            RemoteCall::TextTrackEnterCue { .. } => "onTextTrackEnterCue",
            RemoteCall::TextTrackExitCue { .. } => "onTextTrackExitCue",
            RemoteCall::TextTrackCueChange { .. } => "onTextTrackCueChange",
            RemoteCall::CueEnter { .. } => "onCueEnter",
            RemoteCall::CueExit { .. } => "onCueExit",
            RemoteCall::CueUpdate { .. } => "onCueUpdate",
            RemoteCall::AdBegin(_) => "onAdBegin",
            RemoteCall::AdEnd(_) => "onAdEnd",
            RemoteCall::AdError(_) => "onAdError",
            RemoteCall::AdFirstQuartile(_) => "onAdFirstQuartile",
            RemoteCall::AdMidpoint(_) => "onAdMidpoint",
            RemoteCall::AdThirdQuartile(_) => "onAdThirdQuartile",
            RemoteCall::AdLoaded(_) => "onAdLoaded",
            RemoteCall::AdImpression(_) => "onAdImpression",
            RemoteCall::AdSkip(_) => "onAdSkip",
            RemoteCall::AdTapped(_) => "onAdTapped",
            RemoteCall::AdClicked(_) => "onAdClicked",
            RemoteCall::AddAd(_) => "onAddAd",
            RemoteCall::AdBreakBegin(_) => "onAdBreakBegin",
            RemoteCall::AdBreakEnd(_) => "onAdBreakEnd",
            RemoteCall::AdBreakChange(_) => "onAdBreakChange",
            RemoteCall::AddAdBreak(_) => "onAddAdBreak",
            RemoteCall::RemoveAdBreak(_) => "onRemoveAdBreak",
            RemoteCall::PresentationModeChange { .. } => "onPresentationModeChange",
        }
    }

    /// UID of the entity a call is about, if it names exactly one
    ///
    /// Nested calls (cues, qualities) report the child UID.
    pub fn subject_uid(&self) -> Option<Uid> {
        match self {
            RemoteCall::AddTrack(track) => Some(track.uid),
            RemoteCall::AddTextTrack(track) => Some(track.uid),
            RemoteCall::RemoveTrack { uid }
            | RemoteCall::TrackListChange { uid, .. }
            | RemoteCall::RemoveTextTrack { uid }
            | RemoteCall::TextTrackListChange { uid, .. } => Some(*uid),
            RemoteCall::ActiveQualityChanged { track_uid, .. }
            | RemoteCall::TargetQualityChanged { track_uid, .. }
            | RemoteCall::TextTrackCueChange { track_uid } => Some(*track_uid),
            RemoteCall::TextTrackAddCue { cue_uid, .. }
            | RemoteCall::TextTrackRemoveCue { cue_uid, .. }
            | RemoteCall::TextTrackEnterCue { cue_uid, .. }
            | RemoteCall::TextTrackExitCue { cue_uid, .. }
            | RemoteCall::CueEnter { cue_uid, .. }
            | RemoteCall::CueExit { cue_uid, .. }
            | RemoteCall::CueUpdate { cue_uid, .. } => Some(*cue_uid),
            RemoteCall::AdBegin(call)
            | RemoteCall::AdEnd(call)
            | RemoteCall::AdError(call)
            | RemoteCall::AdFirstQuartile(call)
            | RemoteCall::AdMidpoint(call)
            | RemoteCall::AdThirdQuartile(call)
            | RemoteCall::AdLoaded(call)
            | RemoteCall::AdImpression(call)
            | RemoteCall::AdSkip(call)
            | RemoteCall::AdTapped(call)
            | RemoteCall::AdClicked(call)
            | RemoteCall::AddAd(call) => Some(call.ad.uid),
            RemoteCall::AdBreakBegin(call)
            | RemoteCall::AdBreakEnd(call)
            | RemoteCall::AdBreakChange(call)
            | RemoteCall::AddAdBreak(call)
            | RemoteCall::RemoveAdBreak(call) => Some(call.ad_break.uid),
            RemoteCall::PresentationModeChange { .. } => None,
        }
    }
}

/// Ad lifecycle event types forwarded as `onAd*` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdEventType {
    Begin,
    End,
    Error,
    FirstQuartile,
    Midpoint,
    ThirdQuartile,
    Loaded,
    Impression,
    Skip,
    Tapped,
    Clicked,
    AddAd,
}

impl AdEventType {
    /// Wrap an ad call body into the matching protocol call
    pub fn into_call(self, body: AdCall) -> RemoteCall {
        match self {
            AdEventType::Begin => RemoteCall::AdBegin(body),
            AdEventType::End => RemoteCall::AdEnd(body),
            AdEventType::Error => RemoteCall::AdError(body),
            AdEventType::FirstQuartile => RemoteCall::AdFirstQuartile(body),
            AdEventType::Midpoint => RemoteCall::AdMidpoint(body),
            AdEventType::ThirdQuartile => RemoteCall::AdThirdQuartile(body),
            AdEventType::Loaded => RemoteCall::AdLoaded(body),
            AdEventType::Impression => RemoteCall::AdImpression(body),
            AdEventType::Skip => RemoteCall::AdSkip(body),
            AdEventType::Tapped => RemoteCall::AdTapped(body),
            AdEventType::Clicked => RemoteCall::AdClicked(body),
            AdEventType::AddAd => RemoteCall::AddAd(body),
        }
    }
}

/// Ad break event types forwarded as `onAdBreak*` calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdBreakEventType {
    Begin,
    End,
    Change,
    AddAdBreak,
    RemoveAdBreak,
}

impl AdBreakEventType {
    /// Wrap an ad break call body into the matching protocol call
    pub fn into_call(self, body: AdBreakCall) -> RemoteCall {
        match self {
            AdBreakEventType::Begin => RemoteCall::AdBreakBegin(body),
            AdBreakEventType::End => RemoteCall::AdBreakEnd(body),
            AdBreakEventType::Change => RemoteCall::AdBreakChange(body),
            AdBreakEventType::AddAdBreak => RemoteCall::AddAdBreak(body),
            AdBreakEventType::RemoveAdBreak => RemoteCall::RemoveAdBreak(body),
        }
    }
}
