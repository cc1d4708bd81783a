//! Player: the root of one engine's observable object graph

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mirror_common::protocol::TextTrackMode;
use mirror_common::PlayerId;
use tracing::debug;

use super::ads::Ads;
use super::list::EntityList;
use super::text_track::TextTrack;
use super::track::{MediaTrack, MediaType, Quality};
use super::NativeEntity;

pub struct Player {
    id: PlayerId,
    pip_capable: bool,
    paused: AtomicBool,
    audio_tracks: EntityList<MediaTrack>,
    video_tracks: EntityList<MediaTrack>,
    text_tracks: EntityList<TextTrack>,
    ads: Ads,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            pip_capable: false,
            paused: AtomicBool::new(true),
            audio_tracks: EntityList::new(),
            video_tracks: EntityList::new(),
            text_tracks: EntityList::new(),
            ads: Ads::new(),
        }
    }

    /// Declare the player eligible for picture-in-picture
    pub fn with_pip_capable(mut self, pip_capable: bool) -> Self {
        self.pip_capable = pip_capable;
        self
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn is_pip_capable(&self) -> bool {
        self.pip_capable
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn play(&self) {
        debug!("{}: play", self.id);
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        debug!("{}: pause", self.id);
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn audio_tracks(&self) -> &EntityList<MediaTrack> {
        &self.audio_tracks
    }

    pub fn video_tracks(&self) -> &EntityList<MediaTrack> {
        &self.video_tracks
    }

    pub fn media_tracks(&self, media_type: MediaType) -> &EntityList<MediaTrack> {
        match media_type {
            MediaType::Audio => &self.audio_tracks,
            MediaType::Video => &self.video_tracks,
        }
    }

    pub fn text_tracks(&self) -> &EntityList<TextTrack> {
        &self.text_tracks
    }

    pub fn ads(&self) -> &Ads {
        &self.ads
    }

    /// Toggle a media track and emit `change` on its list when the value changed
    pub fn set_track_enabled(&self, track: &Arc<MediaTrack>, enabled: bool) {
        if track.store_enabled(enabled) {
            self.media_tracks(track.media_type)
                .notify_change(track.native_id());
        }
    }

    pub fn set_target_qualities(&self, track: &Arc<MediaTrack>, qualities: Vec<Arc<Quality>>) {
        track.set_target_qualities(qualities);
    }

    /// Change a text track's mode and emit `change` on the text track list
    pub fn set_text_track_mode(&self, track: &Arc<TextTrack>, mode: TextTrackMode) {
        if track.store_mode(mode) {
            self.text_tracks.notify_change(track.native_id());
        }
    }
}
