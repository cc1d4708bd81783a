//! Text tracks and their cues

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use mirror_common::protocol::TextTrackMode;

use super::dispatch::EventDispatcher;
use super::list::EntityList;
use super::{NativeEntity, NativeId};
use crate::lock::lock;

/// Events emitted by a single cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueEvent {
    Enter,
    Exit,
    /// End time or content changed
    Update,
}

pub struct TextTrackCue {
    native_id: NativeId,
    pub id: String,
    pub start: f64,
    end: Mutex<f64>,
    content: Mutex<serde_json::Value>,
    events: EventDispatcher<CueEvent>,
}

impl TextTrackCue {
    pub fn new(id: impl Into<String>, start: f64, end: f64, content: serde_json::Value) -> Self {
        Self {
            native_id: NativeId::next(),
            id: id.into(),
            start,
            end: Mutex::new(end),
            content: Mutex::new(content),
            events: EventDispatcher::new(),
        }
    }

    pub fn end(&self) -> f64 {
        *lock(&self.end)
    }

    pub fn content(&self) -> serde_json::Value {
        lock(&self.content).clone()
    }

    /// Live cues (e.g. growing live subtitles) extend or rewrite themselves
    pub fn update(&self, end: f64, content: serde_json::Value) {
        *lock(&self.end) = end;
        *lock(&self.content) = content;
        self.events.dispatch(&CueEvent::Update);
    }

    pub fn events(&self) -> &EventDispatcher<CueEvent> {
        &self.events
    }
}

impl NativeEntity for TextTrackCue {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}

/// Events emitted by a single text track
pub enum TextTrackEvent {
    EnterCue(Arc<TextTrackCue>),
    ExitCue(Arc<TextTrackCue>),
    CueChange,
}

pub struct TextTrack {
    native_id: NativeId,
    pub id: String,
    pub label: String,
    pub language: String,
    pub kind: String,
    pub track_type: String,
    pub source: String,
    pub forced: bool,
    ready_state: AtomicU8,
    mode: Mutex<TextTrackMode>,
    cues: EntityList<TextTrackCue>,
    events: EventDispatcher<TextTrackEvent>,
}

impl TextTrack {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        language: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            native_id: NativeId::next(),
            id: id.into(),
            label: label.into(),
            language: language.into(),
            kind: kind.into(),
            track_type: "webvtt".to_string(),
            source: String::new(),
            forced: false,
            ready_state: AtomicU8::new(0),
            mode: Mutex::new(TextTrackMode::Disabled),
            cues: EntityList::new(),
            events: EventDispatcher::new(),
        }
    }

    pub fn with_source(mut self, track_type: impl Into<String>, source: impl Into<String>) -> Self {
        self.track_type = track_type.into();
        self.source = source.into();
        self
    }

    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = forced;
        self
    }

    pub fn ready_state(&self) -> u8 {
        self.ready_state.load(Ordering::SeqCst)
    }

    pub fn set_ready_state(&self, ready_state: u8) {
        self.ready_state.store(ready_state, Ordering::SeqCst);
    }

    pub fn mode(&self) -> TextTrackMode {
        *lock(&self.mode)
    }

    /// Returns `true` if the value changed
    pub(crate) fn store_mode(&self, mode: TextTrackMode) -> bool {
        let mut current = lock(&self.mode);
        let changed = *current != mode;
        *current = mode;
        changed
    }

    pub fn cues(&self) -> &EntityList<TextTrackCue> {
        &self.cues
    }

    pub fn events(&self) -> &EventDispatcher<TextTrackEvent> {
        &self.events
    }

    /// Playback entered a cue: track-level then cue-level events
    pub fn enter_cue(&self, cue: &Arc<TextTrackCue>) {
        self.events.dispatch(&TextTrackEvent::EnterCue(cue.clone()));
        cue.events.dispatch(&CueEvent::Enter);
        self.events.dispatch(&TextTrackEvent::CueChange);
    }

    /// Playback left a cue: track-level then cue-level events
    pub fn exit_cue(&self, cue: &Arc<TextTrackCue>) {
        self.events.dispatch(&TextTrackEvent::ExitCue(cue.clone()));
        cue.events.dispatch(&CueEvent::Exit);
        self.events.dispatch(&TextTrackEvent::CueChange);
    }
}

impl NativeEntity for TextTrack {
    fn native_id(&self) -> NativeId {
        self.native_id
    }
}
