//! Audio and video track lists

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mirror_common::protocol::{QualityPayload, RemoteCall, TrackPayload};
use mirror_common::Uid;
use tracing::{debug, warn};

use super::ForwarderContext;
use crate::binding::ListenerBinding;
use crate::engine::{EntityList, ListEvent, MediaTrack, MediaTrackEvent, NativeEntity, Quality};
use crate::lock::lock;
use crate::registry::EntityRef;

/// Forwards one media track list plus each member's quality events
pub struct MediaTrackForwarder {
    shared: Arc<Shared>,
}

struct Shared {
    ctx: ForwarderContext,
    list: ListenerBinding,
    /// Per-track quality event bindings, keyed by track UID
    tracks: Mutex<HashMap<Uid, ListenerBinding>>,
}

impl MediaTrackForwarder {
    pub fn attach(list: &EntityList<MediaTrack>, ctx: ForwarderContext) -> Self {
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

    /// Stop forwarding: unsubscribe from the list, then from every track
    pub fn detach(&self) {
        self.shared.list.detach();
        let bindings: Vec<ListenerBinding> = lock(&self.shared.tracks)
            .drain()
            .map(|(_, binding)| binding)
            .collect();
        for binding in bindings {
            binding.detach();
        }
    }

    /// Number of tracks currently forwarded
    pub fn tracked(&self) -> usize {
        lock(&self.shared.tracks).len()
    }
}

impl Drop for MediaTrackForwarder {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Shared {
    fn on_list_event(&self, event: &ListEvent<MediaTrack>) {
        match event {
            ListEvent::Add(track) => self.on_add(track),
            ListEvent::Remove(track) => self.on_remove(track),
            ListEvent::Change(track) => self.on_change(track),
        }
    }

    fn on_add(&self, track: &Arc<MediaTrack>) {
        let registry = &self.ctx.registry;
        let mut tracks = lock(&self.tracks);
        let uid = registry.register_or_get(EntityRef::MediaTrack(track.clone()), None);
        if tracks.contains_key(&uid) {
            debug!("Track {} already forwarded", uid);
            return;
        }

        let qualities = track
            .qualities()
            .iter()
            .map(|quality| {
                let quality_uid =
                    registry.register_or_get(EntityRef::Quality(quality.clone()), Some(uid));
                quality_payload(quality_uid, quality)
            })
            .collect();
        let active_quality = track
            .active_quality()
            .and_then(|quality| registry.uid_of(quality.native_id()));

        self.ctx.transport.send(RemoteCall::AddTrack(TrackPayload {
            id: track.id.clone(),
            uid,
            label: track.label.clone(),
            language: track.language.clone(),
            kind: track.media_type.as_str().to_string(),
            enabled: track.is_enabled(),
            qualities,
            active_quality,
        }));

        tracks.insert(uid, self.bind_track(uid, track));
    }

    fn bind_track(&self, track_uid: Uid, track: &MediaTrack) -> ListenerBinding {
        let ctx = self.ctx.clone();
        let listener = move |event: &MediaTrackEvent| {
            let quality_uid = |quality: &Arc<Quality>| {
                ctx.registry
                    .register_or_get(EntityRef::Quality(quality.clone()), Some(track_uid))
            };
            let call = match event {
                MediaTrackEvent::ActiveQualityChanged(quality) => RemoteCall::ActiveQualityChanged {
                    track_uid,
                    quality_uid: quality_uid(quality),
                },
                MediaTrackEvent::TargetQualityChanged(qualities) => {
                    RemoteCall::TargetQualityChanged {
                        track_uid,
                        quality_uids: qualities.iter().map(quality_uid).collect(),
                    }
                }
            };
            ctx.transport.send(call);
        };
        ListenerBinding::with_listener(track.events(), track.events().add_listener(listener))
    }

    fn on_remove(&self, track: &Arc<MediaTrack>) {
        let Some(uid) = self.ctx.registry.uid_of(track.native_id()) else {
            warn!("Removed track {} was never forwarded", track.id);
            return;
        };
        let binding = lock(&self.tracks).remove(&uid);
        if let Some(binding) = binding {
            binding.detach();
        }
        self.ctx.transport.send(RemoteCall::RemoveTrack { uid });
        self.ctx.release_tree(uid);
    }

    fn on_change(&self, track: &Arc<MediaTrack>) {
        let Some(uid) = self.ctx.registry.uid_of(track.native_id()) else {
            warn!("Changed track {} was never forwarded", track.id);
            return;
        };
        self.ctx.transport.send(RemoteCall::TrackListChange {
            uid,
            enabled: track.is_enabled(),
        });
    }
}

fn quality_payload(uid: Uid, quality: &Quality) -> QualityPayload {
    QualityPayload {
        uid,
        id: quality.id.clone(),
        label: quality.label.clone(),
        bandwidth: quality.bandwidth,
        width: quality.width,
        height: quality.height,
    }
}
