//! Observable surface of the native media engine
//!
//! The bridge never reaches into decoding or playback internals. It consumes
//! the engine only through this surface: entity lists that emit
//! add/remove/change, per-entity event dispatchers, and the engine loop that
//! applies control intents on the engine's own thread.
//!
//! Listeners are invoked while the emitting source holds its lock. A listener
//! must not call back into the source that is invoking it; it may freely use
//! any other source.

mod ads;
mod dispatch;
mod executor;
mod list;
mod player;
mod text_track;
mod track;

pub use ads::{Ad, AdBreak, Ads, AdsEvent};
pub use dispatch::{BindingSource, EventDispatcher, ListenerId, ListenerSource, SourceId};
pub use executor::{EngineCommand, EngineHandle, EngineLoop};
pub use list::{EntityList, ListEvent};
pub use player::Player;
pub use text_track::{CueEvent, TextTrack, TextTrackCue, TextTrackEvent};
pub use track::{MediaTrack, MediaTrackEvent, MediaType, Quality};

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a native engine object
///
/// Assigned once when the object is created and never reused in the process.
/// This is the "native handle" the registry maps to a UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(u64);

static NEXT_NATIVE_ID: AtomicU64 = AtomicU64::new(1);

impl NativeId {
    pub fn next() -> Self {
        NativeId(NEXT_NATIVE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NativeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

/// Anything the engine exposes as a distinct object
pub trait NativeEntity: Send + Sync + 'static {
    fn native_id(&self) -> NativeId;
}
