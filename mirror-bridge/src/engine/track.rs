//! Audio and video tracks with their qualities

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::dispatch::EventDispatcher;
use super::{NativeEntity, NativeId};
use crate::lock::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
}

impl MediaType {
    /// Track kind as reported to the remote runtime
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }
}

/// One rendition of a media track
#[derive(Debug)]
pub struct Quality {
    native_id: NativeId,
    pub id: String,
    pub label: String,
    pub bandwidth: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Quality {
    pub fn new(id: impl Into<String>, label: impl Into<String>, bandwidth: u64) -> Self {
        Self {
            native_id: NativeId::next(),
            id: id.into(),
            label: label.into(),
            bandwidth,
            width: None,
            height: None,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

impl NativeEntity for Quality {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}

/// Events emitted by a single media track
pub enum MediaTrackEvent {
    ActiveQualityChanged(Arc<Quality>),
    TargetQualityChanged(Vec<Arc<Quality>>),
}

/// Audio or video track as exposed by the engine
pub struct MediaTrack {
    native_id: NativeId,
    pub media_type: MediaType,
    pub id: String,
    pub label: String,
    pub language: String,
    enabled: AtomicBool,
    qualities: Vec<Arc<Quality>>,
    active_quality: Mutex<Option<Arc<Quality>>>,
    target_qualities: Mutex<Vec<Arc<Quality>>>,
    events: EventDispatcher<MediaTrackEvent>,
}

impl MediaTrack {
    pub fn new(
        media_type: MediaType,
        id: impl Into<String>,
        label: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            native_id: NativeId::next(),
            media_type,
            id: id.into(),
            label: label.into(),
            language: language.into(),
            enabled: AtomicBool::new(false),
            qualities: Vec::new(),
            active_quality: Mutex::new(None),
            target_qualities: Mutex::new(Vec::new()),
            events: EventDispatcher::new(),
        }
    }

    pub fn with_qualities(mut self, qualities: Vec<Quality>) -> Self {
        self.qualities = qualities.into_iter().map(Arc::new).collect();
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.enabled.store(enabled, Ordering::SeqCst);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Returns `true` if the value changed
    pub(crate) fn store_enabled(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::SeqCst) != enabled
    }

    pub fn qualities(&self) -> &[Arc<Quality>] {
        &self.qualities
    }

    pub fn quality(&self, native_id: NativeId) -> Option<Arc<Quality>> {
        self.qualities
            .iter()
            .find(|q| q.native_id() == native_id)
            .cloned()
    }

    pub fn active_quality(&self) -> Option<Arc<Quality>> {
        lock(&self.active_quality).clone()
    }

    pub fn target_qualities(&self) -> Vec<Arc<Quality>> {
        lock(&self.target_qualities).clone()
    }

    /// Engine switched renditions (ABR decision)
    pub fn set_active_quality(&self, quality: Arc<Quality>) {
        *lock(&self.active_quality) = Some(quality.clone());
        self.events
            .dispatch(&MediaTrackEvent::ActiveQualityChanged(quality));
    }

    /// Restrict ABR to the given renditions; an empty list means "automatic"
    pub fn set_target_qualities(&self, qualities: Vec<Arc<Quality>>) {
        *lock(&self.target_qualities) = qualities.clone();
        self.events
            .dispatch(&MediaTrackEvent::TargetQualityChanged(qualities));
    }

    pub fn events(&self) -> &EventDispatcher<MediaTrackEvent> {
        &self.events
    }
}

impl NativeEntity for MediaTrack {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}
