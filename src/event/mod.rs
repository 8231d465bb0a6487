//! Adapting imperative add/remove-listener APIs into sequences.
//!
//! An [`EventSource`] is anything that can register and deregister a callback
//! for a kind of event: a UI element, a file watcher, a bus. [`from_event`]
//! turns one event kind of such a source into a cold sequence. Every
//! subscription registers its own [`Listener`] and cancelling the subscription
//! removes exactly that listener again.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rxsandbox::event::{from_event, EventTarget};
//! use rxsandbox::subscribe::{Subscriber, Unsubscribeable};
//! use rxsandbox::{ObservableExt, Subscribeable};
//!
//! let input: Arc<EventTarget<String>> = Arc::new(EventTarget::new());
//!
//! let subscription = from_event(Arc::clone(&input), "input")
//!     .filter(|text: &String| text.len() > 5)
//!     .distinct_until_changed()
//!     .subscribe(Subscriber::on_next(|text| println!("|fromEvent| {}", text)));
//!
//! input.dispatch("input", &"hello world".to_string());
//!
//! subscription.unsubscribe();
//! assert_eq!(input.listener_count("input"), 0);
//! ```

use std::{fmt, sync::Arc};

use crate::errors::EventError;

mod from_event;
mod target;

pub use from_event::*;
pub use target::*;

/// Closure type for event listeners.
pub type ListenerFn<E> = dyn Fn(&E) + Send + Sync;

/// A registered callback with identity.
///
/// Clones refer to the same callback, so a source can find the exact
/// registration to remove by comparing with [`Listener::same_as`]. Two
/// listeners built from identical closures are still different listeners.
pub struct Listener<E>(Arc<ListenerFn<E>>);

impl<E> Listener<E> {
    pub fn new(callback: impl Fn(&E) + Send + Sync + 'static) -> Self {
        Listener(Arc::new(callback))
    }

    /// Invokes the callback with `event`.
    pub fn call(&self, event: &E) {
        (self.0)(event);
    }

    /// Returns `true` if both handles refer to the same registered callback.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Listener(Arc::clone(&self.0))
    }
}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Capability of registering and deregistering listeners for a kind of event.
///
/// Faults are reported synchronously through the returned `Result`; the
/// adapter passes them on to its caller without retrying.
pub trait EventSource {
    /// Payload delivered to listeners.
    type Event;

    /// Identifies which event stream a listener observes, e.g. `"click"`.
    type Kind;

    /// Registers `listener` for events of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source rejects the registration.
    fn add_listener(&self, kind: &Self::Kind, listener: Listener<Self::Event>) -> Result<(), EventError>;

    /// Removes the registration of `listener` for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source rejects the removal.
    fn remove_listener(
        &self,
        kind: &Self::Kind,
        listener: &Listener<Self::Event>,
    ) -> Result<(), EventError>;
}
