//! Listener bindings
//!
//! A [`ListenerBinding`] pairs one event source with the listeners a forwarder
//! attached to it, so that teardown removes every one of them exactly once.

use std::sync::{Mutex, Weak};

use tracing::trace;

use crate::engine::{BindingSource, ListenerId, ListenerSource, SourceId};
use crate::lock::lock;

pub struct ListenerBinding {
    source: Weak<dyn ListenerSource>,
    source_id: SourceId,
    /// `None` once detached
    handles: Mutex<Option<Vec<ListenerId>>>,
}

impl ListenerBinding {
    /// Bind to a source; the source is held weakly
    pub fn new<S: BindingSource + ?Sized>(source: &S) -> Self {
        Self {
            source: source.listener_source(),
            source_id: source.source_id(),
            handles: Mutex::new(Some(Vec::new())),
        }
    }

    /// Bind to a source with one listener already attached
    pub fn with_listener<S: BindingSource + ?Sized>(source: &S, id: ListenerId) -> Self {
        let binding = Self::new(source);
        binding.push(id);
        binding
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    /// Record a listener attached to the bound source
    ///
    /// A listener pushed after `detach` is removed from the source right away.
    pub fn push(&self, id: ListenerId) {
        let mut handles = lock(&self.handles);
        match handles.as_mut() {
            Some(list) => list.push(id),
            None => {
                drop(handles);
                if let Some(source) = self.source.upgrade() {
                    source.remove_listener(id);
                }
            }
        }
    }

    /// Remove every listener from the source; further calls are no-ops
    ///
    /// Returns how many listeners were actually removed. A source that no
    /// longer exists has nothing left to remove.
    pub fn detach(&self) -> usize {
        let Some(handles) = lock(&self.handles).take() else {
            return 0;
        };
        let Some(source) = self.source.upgrade() else {
            return 0;
        };
        let removed = handles
            .into_iter()
            .filter(|id| source.remove_listener(*id))
            .count();
        trace!("Detached {} listener(s) from {:?}", removed, self.source_id);
        removed
    }

    pub fn is_detached(&self) -> bool {
        lock(&self.handles).is_none()
    }
}

impl Drop for ListenerBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EventDispatcher;

    #[test]
    fn test_detach_removes_each_listener_once() {
        let dispatcher = EventDispatcher::<()>::new();
        let binding = ListenerBinding::new(&dispatcher);
        binding.push(dispatcher.add_listener(|_| {}));
        binding.push(dispatcher.add_listener(|_| {}));
        assert_eq!(dispatcher.listener_count(), 2);

        assert_eq!(binding.detach(), 2);
        assert_eq!(binding.detach(), 0);
        assert!(binding.is_detached());
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let dispatcher = EventDispatcher::<()>::new();
        {
            let _binding =
                ListenerBinding::with_listener(&dispatcher, dispatcher.add_listener(|_| {}));
            assert_eq!(dispatcher.listener_count(), 1);
        }
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_push_after_detach_is_removed() {
        let dispatcher = EventDispatcher::<()>::new();
        let binding = ListenerBinding::new(&dispatcher);
        binding.detach();

        binding.push(dispatcher.add_listener(|_| {}));
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_source_already_gone_is_noop() {
        let dispatcher = EventDispatcher::<()>::new();
        let binding = ListenerBinding::with_listener(&dispatcher, dispatcher.add_listener(|_| {}));
        drop(dispatcher);

        assert_eq!(binding.detach(), 0);
        assert!(binding.is_detached());
    }
}
