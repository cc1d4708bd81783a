//! Entity registry
//!
//! Assigns the stable UID under which every mirrored entity is known to the
//! remote runtime, and resolves UIDs coming back from it. Pure bookkeeping:
//! no I/O, no listeners.
//!
//! Parent/child relations are stored as UIDs (arena + index), never as
//! pointers between entities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mirror_common::Uid;
use tracing::debug;

use crate::engine::{
    Ad, AdBreak, MediaTrack, NativeEntity, NativeId, Quality, TextTrack, TextTrackCue,
};
use crate::error::{Error, Result};
use crate::lock::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    MediaTrack,
    Quality,
    TextTrack,
    Cue,
    Ad,
    AdBreak,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::MediaTrack => "media track",
            EntityKind::Quality => "quality",
            EntityKind::TextTrack => "text track",
            EntityKind::Cue => "cue",
            EntityKind::Ad => "ad",
            EntityKind::AdBreak => "ad break",
        };
        f.write_str(name)
    }
}

/// Strong reference to a registered engine object
#[derive(Clone)]
pub enum EntityRef {
    MediaTrack(Arc<MediaTrack>),
    Quality(Arc<Quality>),
    TextTrack(Arc<TextTrack>),
    Cue(Arc<TextTrackCue>),
    Ad(Arc<Ad>),
    AdBreak(Arc<AdBreak>),
}

impl EntityRef {
    pub fn native_id(&self) -> NativeId {
        match self {
            EntityRef::MediaTrack(e) => e.native_id(),
            EntityRef::Quality(e) => e.native_id(),
            EntityRef::TextTrack(e) => e.native_id(),
            EntityRef::Cue(e) => e.native_id(),
            EntityRef::Ad(e) => e.native_id(),
            EntityRef::AdBreak(e) => e.native_id(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::MediaTrack(_) => EntityKind::MediaTrack,
            EntityRef::Quality(_) => EntityKind::Quality,
            EntityRef::TextTrack(_) => EntityKind::TextTrack,
            EntityRef::Cue(_) => EntityKind::Cue,
            EntityRef::Ad(_) => EntityKind::Ad,
            EntityRef::AdBreak(_) => EntityKind::AdBreak,
        }
    }
}

#[derive(Clone)]
pub struct EntityRecord {
    pub uid: Uid,
    pub parent: Option<Uid>,
    pub entity: EntityRef,
}

struct RegistryInner {
    next_uid: u64,
    by_native: HashMap<NativeId, Uid>,
    records: HashMap<Uid, EntityRecord>,
}

/// UID bookkeeping for one session
///
/// UIDs start at 1, increase monotonically and are never handed out twice by
/// the same registry, not even after [`release`](Self::release) or
/// [`clear`](Self::clear).
pub struct EntityRegistry {
    inner: Mutex<RegistryInner>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_uid: 1,
                by_native: HashMap::new(),
                records: HashMap::new(),
            }),
        }
    }

    /// UID for a native object, assigning one on first observation
    ///
    /// Idempotent: while the entry lives, the same native object always
    /// yields the same UID. `parent` is only recorded on first registration.
    pub fn register_or_get(&self, entity: EntityRef, parent: Option<Uid>) -> Uid {
        let mut inner = lock(&self.inner);
        let native_id = entity.native_id();
        if let Some(uid) = inner.by_native.get(&native_id) {
            return *uid;
        }

        let uid = Uid(inner.next_uid);
        inner.next_uid += 1;
        debug!("Registered {} {} as uid {}", entity.kind(), native_id, uid);
        inner.by_native.insert(native_id, uid);
        inner.records.insert(
            uid,
            EntityRecord {
                uid,
                parent,
                entity,
            },
        );
        uid
    }

    pub fn uid_of(&self, native_id: NativeId) -> Option<Uid> {
        lock(&self.inner).by_native.get(&native_id).copied()
    }

    pub fn lookup(&self, uid: Uid) -> Option<EntityRecord> {
        lock(&self.inner).records.get(&uid).cloned()
    }

    /// Like [`lookup`](Self::lookup), with a stale UID reported as an error
    pub fn resolve(&self, uid: Uid) -> Result<EntityRecord> {
        self.lookup(uid).ok_or(Error::NotFound(uid))
    }

    pub fn resolve_media_track(&self, uid: Uid) -> Result<Arc<MediaTrack>> {
        match self.resolve(uid)?.entity {
            EntityRef::MediaTrack(track) => Ok(track),
            other => Err(kind_mismatch(uid, EntityKind::MediaTrack, other.kind())),
        }
    }

    pub fn resolve_text_track(&self, uid: Uid) -> Result<Arc<TextTrack>> {
        match self.resolve(uid)?.entity {
            EntityRef::TextTrack(track) => Ok(track),
            other => Err(kind_mismatch(uid, EntityKind::TextTrack, other.kind())),
        }
    }

    /// Resolve a quality and check that it belongs to `track_uid`
    pub fn resolve_quality(&self, track_uid: Uid, quality_uid: Uid) -> Result<Arc<Quality>> {
        let record = self.resolve(quality_uid)?;
        match record.entity {
            EntityRef::Quality(quality) if record.parent == Some(track_uid) => Ok(quality),
            EntityRef::Quality(_) => Err(Error::InvalidInput(format!(
                "quality {} does not belong to track {}",
                quality_uid, track_uid
            ))),
            other => Err(kind_mismatch(quality_uid, EntityKind::Quality, other.kind())),
        }
    }

    /// Invalidate a UID; `false` if it was unknown or already released
    ///
    /// Callers release a UID only after every listener attached on behalf of
    /// its entity has been detached, and release children before parents.
    pub fn release(&self, uid: Uid) -> bool {
        let mut inner = lock(&self.inner);
        let Some(record) = inner.records.remove(&uid) else {
            return false;
        };
        inner.by_native.remove(&record.entity.native_id());
        debug!("Released {} uid {}", record.entity.kind(), uid);
        true
    }

    /// UIDs registered with `parent` as their parent, in assignment order
    pub fn children_of(&self, parent: Uid) -> Vec<Uid> {
        let inner = lock(&self.inner);
        let mut children: Vec<Uid> = inner
            .records
            .values()
            .filter(|record| record.parent == Some(parent))
            .map(|record| record.uid)
            .collect();
        children.sort();
        children
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry (session teardown); the UID counter keeps running
    pub fn clear(&self) -> usize {
        let mut inner = lock(&self.inner);
        let count = inner.records.len();
        inner.records.clear();
        inner.by_native.clear();
        count
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn kind_mismatch(uid: Uid, expected: EntityKind, actual: EntityKind) -> Error {
    Error::InvalidInput(format!("uid {} is a {}, expected a {}", uid, actual, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MediaType;
    use std::collections::HashSet;

    fn track() -> Arc<MediaTrack> {
        Arc::new(MediaTrack::new(MediaType::Audio, "a", "A", "en"))
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = EntityRegistry::new();
        let t = track();

        let first = registry.register_or_get(EntityRef::MediaTrack(t.clone()), None);
        let second = registry.register_or_get(EntityRef::MediaTrack(t.clone()), None);

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.uid_of(t.native_id()), Some(first));
    }

    #[test]
    fn test_uids_unique_and_never_reused() {
        let registry = EntityRegistry::new();
        let mut seen = HashSet::new();

        for _ in 0..50 {
            let uid = registry.register_or_get(EntityRef::MediaTrack(track()), None);
            assert!(seen.insert(uid), "uid {} handed out twice", uid);
            assert!(registry.release(uid));
        }

        // Re-registering a released native object yields a fresh UID
        let t = track();
        let before = registry.register_or_get(EntityRef::MediaTrack(t.clone()), None);
        registry.release(before);
        let after = registry.register_or_get(EntityRef::MediaTrack(t), None);
        assert_ne!(before, after);
        assert!(seen.insert(after));
    }

    #[test]
    fn test_released_uid_is_not_found() {
        let registry = EntityRegistry::new();
        let uid = registry.register_or_get(EntityRef::MediaTrack(track()), None);

        assert!(registry.release(uid));
        assert!(!registry.release(uid), "second release is a no-op");
        assert!(registry.lookup(uid).is_none());
        assert!(matches!(registry.resolve(uid), Err(Error::NotFound(u)) if u == uid));
        assert!(matches!(registry.resolve_media_track(Uid(999)), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_typed_resolution_checks_kind_and_parent() {
        let registry = EntityRegistry::new();
        let t = Arc::new(
            MediaTrack::new(MediaType::Video, "v", "V", "")
                .with_qualities(vec![Quality::new("q1", "720p", 3_000_000)]),
        );
        let track_uid = registry.register_or_get(EntityRef::MediaTrack(t.clone()), None);
        let quality_uid = registry.register_or_get(
            EntityRef::Quality(t.qualities()[0].clone()),
            Some(track_uid),
        );
        let other_uid = registry.register_or_get(EntityRef::MediaTrack(track()), None);

        assert!(registry.resolve_quality(track_uid, quality_uid).is_ok());
        assert!(matches!(
            registry.resolve_quality(other_uid, quality_uid),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            registry.resolve_text_track(track_uid),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(registry.children_of(track_uid), vec![quality_uid]);
    }

    #[test]
    fn test_clear_keeps_counter() {
        let registry = EntityRegistry::new();
        let a = registry.register_or_get(EntityRef::MediaTrack(track()), None);
        assert_eq!(registry.clear(), 1);
        assert!(registry.is_empty());

        let b = registry.register_or_get(EntityRef::MediaTrack(track()), None);
        assert!(b > a);
    }
}
