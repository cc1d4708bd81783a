//! Per-entity event dispatchers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::lock::lock;

/// Identity of an event source (dispatcher or entity list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    pub(crate) fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle of one attached listener, unique within its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(raw: u64) -> Self {
        ListenerId(raw)
    }
}

pub(crate) type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Type-erased view of an event source, used for teardown
pub trait ListenerSource: Send + Sync {
    fn source_id(&self) -> SourceId;

    /// Detach a listener; `false` if it was not attached (already removed)
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Sources a [`ListenerBinding`](crate::binding::ListenerBinding) can hold
pub trait BindingSource {
    fn listener_source(&self) -> Weak<dyn ListenerSource>;

    fn source_id(&self) -> SourceId;
}

struct DispatcherShared<E> {
    source_id: SourceId,
    state: Mutex<DispatcherState<E>>,
}

struct DispatcherState<E> {
    next_listener: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
}

/// FIFO event dispatcher owned by an engine entity
///
/// Events are delivered to listeners in attach order, one event at a time.
/// Removing a listener waits for any in-flight delivery on this dispatcher,
/// so once `remove_listener` returns the listener will never run again.
pub struct EventDispatcher<E> {
    shared: Arc<DispatcherShared<E>>,
}

impl<E: 'static> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(DispatcherShared {
                source_id: SourceId::next(),
                state: Mutex::new(DispatcherState {
                    next_listener: 1,
                    listeners: Vec::new(),
                }),
            }),
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut state = lock(&self.shared.state);
        let id = ListenerId::new(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.remove(id)
    }

    /// Deliver an event to every attached listener
    pub fn dispatch(&self, event: &E) {
        self.dispatch_after(|| (), event);
    }

    /// Apply `update` and deliver `event` as one step
    ///
    /// No [`observe`](Self::observe) call can run between the two, so a new
    /// listener either replays the updated state or receives the event.
    pub fn dispatch_after<R>(&self, update: impl FnOnce() -> R, event: &E) -> R {
        let state = lock(&self.shared.state);
        let result = update();
        for (_, listener) in state.listeners.iter() {
            listener(event);
        }
        result
    }

    /// Replay synthesized events to a new listener, then subscribe it
    ///
    /// `replay` runs under the dispatcher lock, so it sees exactly the state
    /// that preceded the first live event the listener will receive.
    pub fn observe<F>(&self, replay: impl FnOnce() -> Vec<E>, listener: F) -> ListenerId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut state = lock(&self.shared.state);
        for event in replay() {
            listener(&event);
        }
        let id = ListenerId::new(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.shared.state).listeners.len()
    }
}

impl<E: 'static> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> DispatcherShared<E> {
    fn remove(&self, id: ListenerId) -> bool {
        let mut state = lock(&self.state);
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }
}

impl<E: 'static> ListenerSource for DispatcherShared<E> {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.remove(id)
    }
}

impl<E: 'static> BindingSource for EventDispatcher<E> {
    fn listener_source(&self) -> Weak<dyn ListenerSource> {
        let weak: Weak<DispatcherShared<E>> = Arc::downgrade(&self.shared);
        weak
    }

    fn source_id(&self) -> SourceId {
        self.shared.source_id
    }
}
