use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet},
    fmt::Debug,
    hash::Hash,
};

use parking_lot::Mutex;
use tracing::trace;

use super::{EventSource, Listener};
use crate::errors::EventError;

struct Registry<E, K> {
    listeners: HashMap<K, Vec<Listener<E>>>,
    closed: bool,
}

/// In-memory event source, standing in for a UI element or any other
/// externally driven emitter.
///
/// Events are raised with [`dispatch`]. Listeners are called synchronously, in
/// registration order, on the dispatching thread. The set of listeners is
/// snapshotted when a dispatch starts and no lock is held while they run, so a
/// listener may add or remove listeners (including itself) during a dispatch.
/// Such changes take effect from the next dispatch.
///
/// Registering a listener that is already registered for the same kind has no
/// effect.
///
/// [`dispatch`]: #method.dispatch
pub struct EventTarget<E, K = String> {
    registry: Mutex<Registry<E, K>>,
    supported: Option<HashSet<K>>,
}

impl<E, K> EventTarget<E, K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates a target accepting listeners for any kind of event.
    pub fn new() -> Self {
        EventTarget {
            registry: Mutex::new(Registry {
                listeners: HashMap::new(),
                closed: false,
            }),
            supported: None,
        }
    }

    /// Creates a target that only raises the given kinds of events. Adding or
    /// removing a listener for any other kind fails with
    /// [`EventError::UnsupportedKind`].
    pub fn with_kinds(kinds: impl IntoIterator<Item = K>) -> Self {
        EventTarget {
            supported: Some(kinds.into_iter().collect()),
            ..Self::new()
        }
    }

    /// Raises `event` for every listener registered for `kind` and returns how
    /// many listeners were called.
    pub fn dispatch<Q>(&self, kind: &Q, event: &E) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let snapshot: Vec<Listener<E>> = match self.registry.lock().listeners.get(kind) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };
        trace!(?kind, listeners = snapshot.len(), "dispatching event");
        for listener in &snapshot {
            listener.call(event);
        }
        snapshot.len()
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count<Q>(&self, kind: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.registry
            .lock()
            .listeners
            .get(kind)
            .map_or(0, Vec::len)
    }

    /// Drops every registered listener and rejects further registrations with
    /// [`EventError::Closed`].
    ///
    /// Subscriptions created on this target stay as they are; cancelling them
    /// afterwards succeeds without effect.
    pub fn close(&self) {
        let mut registry = self.registry.lock();
        registry.closed = true;
        registry.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.registry.lock().closed
    }

    fn check_kind(&self, kind: &K) -> Result<(), EventError> {
        match &self.supported {
            Some(supported) if !supported.contains(kind) => {
                Err(EventError::UnsupportedKind(format!("{:?}", kind)))
            }
            _ => Ok(()),
        }
    }
}

impl<E, K> Default for EventTarget<E, K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, K> EventSource for EventTarget<E, K>
where
    K: Eq + Hash + Clone + Debug,
{
    type Event = E;
    type Kind = K;

    fn add_listener(&self, kind: &K, listener: Listener<E>) -> Result<(), EventError> {
        self.check_kind(kind)?;

        let mut registry = self.registry.lock();
        if registry.closed {
            return Err(EventError::Closed);
        }
        let listeners = registry.listeners.entry(kind.clone()).or_default();
        if !listeners.iter().any(|l| l.same_as(&listener)) {
            listeners.push(listener);
        }
        Ok(())
    }

    fn remove_listener(&self, kind: &K, listener: &Listener<E>) -> Result<(), EventError> {
        self.check_kind(kind)?;

        let mut registry = self.registry.lock();
        let emptied = match registry.listeners.get_mut(kind) {
            Some(listeners) => {
                if let Some(pos) = listeners.iter().position(|l| l.same_as(listener)) {
                    listeners.remove(pos);
                }
                listeners.is_empty()
            }
            None => false,
        };
        if emptied {
            registry.listeners.remove(kind);
        }
        Ok(())
    }
}
