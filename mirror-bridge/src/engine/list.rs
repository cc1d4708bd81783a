//! Ordered entity lists with add/remove/change events

use std::sync::{Arc, Mutex, Weak};

use super::dispatch::{BindingSource, Listener, ListenerId, ListenerSource, SourceId};
use super::{NativeEntity, NativeId};
use crate::lock::lock;

/// Membership event emitted by an [`EntityList`]
pub enum ListEvent<T> {
    Add(Arc<T>),
    Remove(Arc<T>),
    /// A member's list-level state changed (e.g. track enabled, text track mode)
    Change(Arc<T>),
}

impl<T> ListEvent<T> {
    pub fn entity(&self) -> &Arc<T> {
        match self {
            ListEvent::Add(entity) | ListEvent::Remove(entity) | ListEvent::Change(entity) => entity,
        }
    }
}

struct ListShared<T> {
    source_id: SourceId,
    state: Mutex<ListState<T>>,
}

struct ListState<T> {
    members: Vec<Arc<T>>,
    next_listener: u64,
    listeners: Vec<(ListenerId, Listener<ListEvent<T>>)>,
}

/// Ordered collection of one kind of entity, itself an event source
///
/// Membership changes and listener delivery happen under one lock, so every
/// listener observes the list's events in the order they were applied, and
/// [`observe`](Self::observe) can snapshot-and-subscribe atomically.
pub struct EntityList<T> {
    shared: Arc<ListShared<T>>,
}

impl<T: NativeEntity> EntityList<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(ListShared {
                source_id: SourceId::next(),
                state: Mutex::new(ListState {
                    members: Vec::new(),
                    next_listener: 1,
                    listeners: Vec::new(),
                }),
            }),
        }
    }

    /// Append a member and emit `Add`; re-adding a current member is ignored
    pub fn add(&self, entity: Arc<T>) -> bool {
        let mut state = lock(&self.shared.state);
        if state
            .members
            .iter()
            .any(|m| m.native_id() == entity.native_id())
        {
            return false;
        }
        state.members.push(entity.clone());
        Self::deliver(&state, &ListEvent::Add(entity));
        true
    }

    /// Remove a member and emit `Remove`; unknown entities are ignored
    pub fn remove(&self, native_id: NativeId) -> Option<Arc<T>> {
        let mut state = lock(&self.shared.state);
        let index = state.members.iter().position(|m| m.native_id() == native_id)?;
        let entity = state.members.remove(index);
        Self::deliver(&state, &ListEvent::Remove(entity.clone()));
        Some(entity)
    }

    /// Emit `Change` for a current member
    pub fn notify_change(&self, native_id: NativeId) -> bool {
        let state = lock(&self.shared.state);
        let Some(entity) = state.members.iter().find(|m| m.native_id() == native_id).cloned() else {
            return false;
        };
        Self::deliver(&state, &ListEvent::Change(entity));
        true
    }

    pub fn get(&self, native_id: NativeId) -> Option<Arc<T>> {
        lock(&self.shared.state)
            .members
            .iter()
            .find(|m| m.native_id() == native_id)
            .cloned()
    }

    pub fn members(&self) -> Vec<Arc<T>> {
        lock(&self.shared.state).members.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.state).members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to future events without replaying current members
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ListEvent<T>) + Send + Sync + 'static,
    {
        let mut state = lock(&self.shared.state);
        Self::push_listener(&mut state, Arc::new(listener))
    }

    /// Snapshot current members and subscribe, as one atomic step
    ///
    /// The listener first receives one synthesized `Add` per existing member,
    /// then every live event. No concurrent add or remove can slip between
    /// the snapshot and the subscription.
    pub fn observe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ListEvent<T>) + Send + Sync + 'static,
    {
        let mut state = lock(&self.shared.state);
        let listener: Listener<ListEvent<T>> = Arc::new(listener);
        for member in state.members.iter() {
            listener(&ListEvent::Add(member.clone()));
        }
        Self::push_listener(&mut state, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.shared.state).listeners.len()
    }

    fn push_listener(state: &mut ListState<T>, listener: Listener<ListEvent<T>>) -> ListenerId {
        let id = ListenerId::new(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, listener));
        id
    }

    fn deliver(state: &ListState<T>, event: &ListEvent<T>) {
        for (_, listener) in state.listeners.iter() {
            listener(event);
        }
    }
}

impl<T: NativeEntity> Default for EntityList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListShared<T> {
    fn remove(&self, id: ListenerId) -> bool {
        let mut state = lock(&self.state);
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }
}

impl<T: NativeEntity> ListenerSource for ListShared<T> {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.remove(id)
    }
}

impl<T: NativeEntity> BindingSource for EntityList<T> {
    fn listener_source(&self) -> Weak<dyn ListenerSource> {
        let weak: Weak<ListShared<T>> = Arc::downgrade(&self.shared);
        weak
    }

    fn source_id(&self) -> SourceId {
        self.shared.source_id
    }
}
