//! Event forwarders
//!
//! A forwarder watches one category of engine entities and translates what
//! happens to them into outbound [`RemoteCall`]s. All forwarders follow the
//! same protocol:
//!
//! - **attach**: snapshot the list and subscribe in one step; every existing
//!   member is reported through exactly one synthesized `add`
//! - **add**: register the entity, send its full attribute snapshot, then
//!   attach the nested bindings for its own events
//! - **remove**: tear down nested bindings innermost first, send the removal
//!   (UID only), then release child UIDs and the entity's UID
//! - **change**: send the UID with the changed fields
//!
//! Nested listeners only capture UIDs and only touch the registry and the
//! transport, never the state of the forwarder that attached them.
//!
//! [`RemoteCall`]: mirror_common::protocol::RemoteCall

mod ads;
mod cue;
mod media_track;
mod text_track;

pub use ads::{AdBreakForwarder, AdForwarder};
pub use cue::CueForwarder;
pub use media_track::MediaTrackForwarder;
pub use text_track::TextTrackForwarder;

use std::sync::Arc;

use mirror_common::Uid;

use crate::registry::EntityRegistry;
use crate::transport::Transport;

/// What every forwarder needs: the session's registry and transport
#[derive(Clone)]
pub struct ForwarderContext {
    pub registry: Arc<EntityRegistry>,
    pub transport: Transport,
}

impl ForwarderContext {
    pub fn new(registry: Arc<EntityRegistry>, transport: Transport) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Release the children of `uid`, then `uid` itself
    pub(crate) fn release_tree(&self, uid: Uid) {
        for child in self.registry.children_of(uid) {
            self.release_tree(child);
        }
        self.registry.release(uid);
    }
}
