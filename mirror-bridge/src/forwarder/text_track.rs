//! Text track list, with a nested cue forwarder per track

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mirror_common::protocol::{RemoteCall, TextTrackPayload};
use mirror_common::Uid;
use tracing::{debug, warn};

use super::{CueForwarder, ForwarderContext};
use crate::binding::ListenerBinding;
use crate::engine::{EntityList, ListEvent, NativeEntity, TextTrack, TextTrackEvent};
use crate::lock::lock;
use crate::registry::EntityRef;

pub struct TextTrackForwarder {
    shared: Arc<Shared>,
}

/// Everything attached on behalf of one text track
struct Nested {
    cues: CueForwarder,
    events: ListenerBinding,
}

impl Nested {
    /// Innermost first: cue bindings, then the track's own events
    fn detach(&self) {
        self.cues.detach();
        self.events.detach();
    }
}

struct Shared {
    ctx: ForwarderContext,
    list: ListenerBinding,
    tracks: Mutex<HashMap<Uid, Nested>>,
}

impl TextTrackForwarder {
    pub fn attach(list: &EntityList<TextTrack>, ctx: ForwarderContext) -> Self {
        let shared = Arc::new(Shared {
            ctx,
            list: ListenerBinding::new(list),
            tracks: Mutex::new(HashMap::new()),
        });
        let weak = Arc::downgrade(&shared);
        let id = list.observe(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_list_event(event);
            }
        });
        shared.list.push(id);
        Self { shared }
    }

    pub fn detach(&self) {
        self.shared.list.detach();
        let nested: Vec<Nested> = lock(&self.shared.tracks)
            .drain()
            .map(|(_, nested)| nested)
            .collect();
        for n in nested {
            n.detach();
        }
    }

    pub fn tracked(&self) -> usize {
        lock(&self.shared.tracks).len()
    }
}

impl Drop for TextTrackForwarder {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Shared {
    fn on_list_event(&self, event: &ListEvent<TextTrack>) {
        match event {
            ListEvent::Add(track) => self.on_add(track),
            ListEvent::Remove(track) => self.on_remove(track),
            ListEvent::Change(track) => match self.ctx.registry.uid_of(track.native_id()) {
                Some(uid) => self.ctx.transport.send(RemoteCall::TextTrackListChange {
                    uid,
                    mode: track.mode(),
                }),
                None => warn!("Changed text track {} was never forwarded", track.id),
            },
        }
    }

    fn on_add(&self, track: &Arc<TextTrack>) {
        let mut tracks = lock(&self.tracks);
        let uid = self
            .ctx
            .registry
            .register_or_get(EntityRef::TextTrack(track.clone()), None);
        if tracks.contains_key(&uid) {
            debug!("Text track {} already forwarded", uid);
            return;
        }

        self.ctx
            .transport
            .send(RemoteCall::AddTextTrack(TextTrackPayload {
                id: track.id.clone(),
                uid,
                label: track.label.clone(),
                language: track.language.clone(),
                kind: track.kind.clone(),
                ready_state: track.ready_state(),
                track_type: track.track_type.clone(),
                source: track.source.clone(),
                forced: track.forced,
                mode: track.mode(),
            }));

        let events = self.bind_track(uid, track);
        let cues = CueForwarder::attach(uid, track.cues(), self.ctx.clone());
        tracks.insert(uid, Nested { cues, events });
    }

    fn bind_track(&self, track_uid: Uid, track: &TextTrack) -> ListenerBinding {
        let ctx = self.ctx.clone();
        let listener = move |event: &TextTrackEvent| {
            let call = match event {
                TextTrackEvent::EnterCue(cue) | TextTrackEvent::ExitCue(cue) => {
                    let Some(cue_uid) = ctx.registry.uid_of(cue.native_id()) else {
                        debug!("Cue {} of track {} is not mirrored", cue.id, track_uid);
                        return;
                    };
                    if matches!(event, TextTrackEvent::EnterCue(_)) {
                        RemoteCall::TextTrackEnterCue { track_uid, cue_uid }
                    } else {
                        RemoteCall::TextTrackExitCue { track_uid, cue_uid }
                    }
                }
                TextTrackEvent::CueChange => RemoteCall::TextTrackCueChange { track_uid },
            };
            ctx.transport.send(call);
        };
        ListenerBinding::with_listener(track.events(), track.events().add_listener(listener))
    }

    fn on_remove(&self, track: &Arc<TextTrack>) {
        let Some(uid) = self.ctx.registry.uid_of(track.native_id()) else {
            warn!("Removed text track {} was never forwarded", track.id);
            return;
        };
        let nested = lock(&self.tracks).remove(&uid);
        if let Some(nested) = nested {
            nested.detach();
        }
        self.ctx.transport.send(RemoteCall::RemoveTextTrack { uid });
        self.ctx.release_tree(uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TextTrackCue;
    use crate::forwarder::test_support::Harness;
    use mirror_common::protocol::TextTrackMode;
    use serde_json::json;

    fn subtitles() -> Arc<TextTrack> {
        Arc::new(
            TextTrack::new("t1", "English", "en", "subtitles")
                .with_source("webvtt", "https://cdn.example/en.vtt"),
        )
    }

    #[test]
    fn test_track_and_cue_events_are_nested() {
        let mut harness = Harness::new();
        let list = EntityList::new();
        let _forwarder = TextTrackForwarder::attach(&list, harness.ctx.clone());

        let track = subtitles();
        let cue = Arc::new(TextTrackCue::new("c1", 1.0, 3.0, json!("hi")));
        track.cues().add(cue.clone());
        list.add(track.clone());
        track.enter_cue(&cue);

        assert_eq!(
            harness.methods(),
            vec![
                "onAddTextTrack",
                "onTextTrackAddCue",
                "onTextTrackEnterCue",
                "onCueEnter",
                "onTextTrackCueChange",
            ]
        );
    }

    #[test]
    fn test_mode_change_is_forwarded() {
        let mut harness = Harness::new();
        let list = EntityList::new();
        let _forwarder = TextTrackForwarder::attach(&list, harness.ctx.clone());
        let track = subtitles();
        list.add(track.clone());
        harness.calls();

        track.store_mode(TextTrackMode::Showing);
        list.notify_change(track.native_id());

        let uid = harness.ctx.registry.uid_of(track.native_id()).unwrap();
        assert_eq!(
            harness.calls(),
            vec![RemoteCall::TextTrackListChange {
                uid,
                mode: TextTrackMode::Showing
            }]
        );
    }

    #[test]
    fn test_remove_silences_cues_and_releases_them() {
        let mut harness = Harness::new();
        let list = EntityList::new();
        let forwarder = TextTrackForwarder::attach(&list, harness.ctx.clone());
        let track = subtitles();
        let cue = Arc::new(TextTrackCue::new("c1", 1.0, 3.0, json!("hi")));
        track.cues().add(cue.clone());
        list.add(track.clone());

        list.remove(track.native_id());
        track.enter_cue(&cue);
        cue.update(4.0, json!("late"));
        track.cues().add(Arc::new(TextTrackCue::new("c2", 5.0, 6.0, json!("late"))));

        assert_eq!(
            harness.methods(),
            vec!["onAddTextTrack", "onTextTrackAddCue", "onRemoveTextTrack"]
        );
        assert!(harness.ctx.registry.is_empty());
        assert_eq!(forwarder.tracked(), 0);
        assert_eq!(track.cues().listener_count(), 0);
        assert_eq!(cue.events().listener_count(), 0);
    }

    #[test]
    fn test_add_carries_track_attributes() {
        let mut harness = Harness::new();
        let list = EntityList::new();
        let _forwarder = TextTrackForwarder::attach(&list, harness.ctx.clone());

        let track = Arc::new(
            TextTrack::new("forced-fr", "Français", "fr", "subtitles").with_forced(true),
        );
        track.set_ready_state(2);
        list.add(track);

        let calls = harness.calls();
        let RemoteCall::AddTextTrack(payload) = &calls[0] else {
            panic!("expected onAddTextTrack, got {:?}", calls);
        };
        assert!(payload.forced);
        assert_eq!(payload.ready_state, 2);
        assert_eq!(payload.track_type, "webvtt");
        assert_eq!(payload.mode, TextTrackMode::Disabled);
    }
}
