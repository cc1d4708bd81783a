//! Cue list of one text track

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mirror_common::protocol::RemoteCall;
use mirror_common::Uid;
use tracing::warn;

use super::ForwarderContext;
use crate::binding::ListenerBinding;
use crate::engine::{CueEvent, EntityList, ListEvent, NativeEntity, TextTrackCue};
use crate::lock::lock;
use crate::registry::EntityRef;

/// Forwards the cues of one text track, nested under that track's forwarder
pub struct CueForwarder {
    shared: Arc<Shared>,
}

struct Shared {
    ctx: ForwarderContext,
    track_uid: Uid,
    list: ListenerBinding,
    cues: Mutex<HashMap<Uid, ListenerBinding>>,
}

impl CueForwarder {
    pub fn attach(track_uid: Uid, cues: &EntityList<TextTrackCue>, ctx: ForwarderContext) -> Self {
        let shared = Arc::new(Shared {
            ctx,
            track_uid,
            list: ListenerBinding::new(cues),
            cues: Mutex::new(HashMap::new()),
        });
        let weak = Arc::downgrade(&shared);
        let id = cues.observe(move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_list_event(event);
            }
        });
        shared.list.push(id);
        Self { shared }
    }

    /// Unsubscribe from the cue list and from every cue
    ///
    /// Waits for any cue event being delivered at the time of the call.
    pub fn detach(&self) {
        self.shared.list.detach();
        let bindings: Vec<ListenerBinding> = lock(&self.shared.cues)
            .drain()
            .map(|(_, binding)| binding)
            .collect();
        for binding in bindings {
            binding.detach();
        }
    }

    pub fn tracked(&self) -> usize {
        lock(&self.shared.cues).len()
    }
}

impl Drop for CueForwarder {
    fn drop(&mut self) {
        self.detach();
    }
}

impl Shared {
    fn on_list_event(&self, event: &ListEvent<TextTrackCue>) {
        match event {
            ListEvent::Add(cue) => self.on_add(cue),
            ListEvent::Remove(cue) => self.on_remove(cue),
            ListEvent::Change(cue) => {
                if let Some(cue_uid) = self.ctx.registry.uid_of(cue.native_id()) {
                    self.ctx
                        .transport
                        .send(cue_update(self.track_uid, cue_uid, cue));
                }
            }
        }
    }

    fn on_add(&self, cue: &Arc<TextTrackCue>) {
        let mut cues = lock(&self.cues);
        let cue_uid = self
            .ctx
            .registry
            .register_or_get(EntityRef::Cue(cue.clone()), Some(self.track_uid));
        if cues.contains_key(&cue_uid) {
            return;
        }

        self.ctx.transport.send(RemoteCall::TextTrackAddCue {
            track_uid: self.track_uid,
            cue_id: cue.id.clone(),
            cue_uid,
            start: cue.start,
            end: cue.end(),
            content: cue.content(),
        });

        cues.insert(cue_uid, self.bind_cue(cue_uid, cue));
    }

    fn bind_cue(&self, cue_uid: Uid, cue: &Arc<TextTrackCue>) -> ListenerBinding {
        let ctx = self.ctx.clone();
        let track_uid = self.track_uid;
        // The cue owns this listener; hold it weakly
        let weak = Arc::downgrade(cue);
        let listener = move |event: &CueEvent| {
            let call = match event {
                CueEvent::Enter => RemoteCall::CueEnter { track_uid, cue_uid },
                CueEvent::Exit => RemoteCall::CueExit { track_uid, cue_uid },
                CueEvent::Update => match weak.upgrade() {
                    Some(cue) => cue_update(track_uid, cue_uid, &cue),
                    None => return,
                },
            };
            ctx.transport.send(call);
        };
        ListenerBinding::with_listener(cue.events(), cue.events().add_listener(listener))
    }

    fn on_remove(&self, cue: &Arc<TextTrackCue>) {
        let Some(cue_uid) = self.ctx.registry.uid_of(cue.native_id()) else {
            warn!("Removed cue {} was never forwarded", cue.id);
            return;
        };
        let binding = lock(&self.cues).remove(&cue_uid);
        if let Some(binding) = binding {
            binding.detach();
        }
        self.ctx.transport.send(RemoteCall::TextTrackRemoveCue {
            track_uid: self.track_uid,
            cue_uid,
        });
        self.ctx.registry.release(cue_uid);
    }
}

fn cue_update(track_uid: Uid, cue_uid: Uid, cue: &TextTrackCue) -> RemoteCall {
    RemoteCall::CueUpdate {
        track_uid,
        cue_uid,
        end: cue.end(),
        content: cue.content(),
    }
}
