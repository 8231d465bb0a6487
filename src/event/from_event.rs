use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::{EventSource, Listener};
use crate::{
    errors::{EventError, UnsubscribeError},
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
    },
};

/// Creates a sequence of the events of `kind` raised by `source`.
///
/// The sequence is cold: nothing is registered with the source until a
/// subscriber attaches, and every attachment registers a listener of its own.
/// Events are delivered synchronously from within the source's dispatch, in
/// the order the source raises them. The sequence never completes or errors
/// by itself; it ends only when its subscription is cancelled.
pub fn from_event<S>(source: Arc<S>, kind: impl Into<S::Kind>) -> FromEvent<S>
where
    S: EventSource,
{
    FromEvent {
        source,
        kind: kind.into(),
    }
}

/// Sequence of events of one kind from an [`EventSource`], created by
/// [`from_event`].
///
/// Attaching with [`try_subscribe`] reports a registration fault to the
/// caller. Attaching through [`Subscribeable::subscribe`], which is what the
/// operators do, delivers the fault to the subscriber's `error` handler and
/// returns a closed subscription instead.
///
/// Cancelling a subscription stops delivery to its subscriber at once, even
/// if the source is in the middle of a dispatch, and then removes exactly the
/// listener that subscription registered.
///
/// A `next` handler may raise further events on the same source. Events that
/// arrive while the subscriber is still handling an earlier one are queued and
/// delivered, in the order the source raised them, once that handler returns.
/// The same applies to events raised concurrently from another thread: they are
/// handed over to the thread that is currently delivering.
///
/// [`EventSource`]: trait.EventSource.html
/// [`from_event`]: fn.from_event.html
/// [`try_subscribe`]: #method.try_subscribe
/// [`Subscribeable::subscribe`]: ../subscribe/trait.Subscribeable.html#tymethod.subscribe
pub struct FromEvent<S: EventSource> {
    source: Arc<S>,
    kind: S::Kind,
}

impl<S> Clone for FromEvent<S>
where
    S: EventSource,
    S::Kind: Clone,
{
    fn clone(&self) -> Self {
        FromEvent {
            source: Arc::clone(&self.source),
            kind: self.kind.clone(),
        }
    }
}

impl<S> FromEvent<S>
where
    S: EventSource + Send + Sync + 'static,
    S::Event: Clone + Send + 'static,
    S::Kind: Clone + Debug + Send + Sync + 'static,
{
    /// Attaches `subscriber`, registering a new listener with the source.
    ///
    /// # Errors
    ///
    /// Returns the source's registration fault; no subscription becomes active
    /// in that case.
    pub fn try_subscribe(&self, subscriber: Subscriber<S::Event>) -> Result<Subscription, EventError> {
        self.attach(Arc::new(Delivery::new(subscriber)))
    }

    fn attach(&self, delivery: Arc<Delivery<S::Event>>) -> Result<Subscription, EventError> {
        let active = Arc::new(AtomicBool::new(true));

        let listener = {
            let active = Arc::clone(&active);
            Listener::new(move |event: &S::Event| {
                if active.load(Ordering::Acquire) {
                    delivery.push(event.clone(), &active);
                }
            })
        };

        self.source.add_listener(&self.kind, listener.clone())?;
        debug!(kind = ?self.kind, "event listener attached");

        let source = Arc::clone(&self.source);
        let kind = self.kind.clone();
        Ok(Subscription::new(
            UnsubscribeLogic::Fallible(Box::new(move || {
                active.store(false, Ordering::Release);
                source
                    .remove_listener(&kind, &listener)
                    .map_err(|e| UnsubscribeError::Teardown(Box::new(e)))?;
                debug!(kind = ?kind, "event listener detached");
                Ok(())
            })),
            SubscriptionHandle::Nil,
        ))
    }
}

// Serializes delivery to one subscriber.
//
// Whoever holds `subscriber` drains `pending`; an event raised while it is held,
// from inside a handler or from another thread, is queued for that holder.
struct Delivery<T> {
    subscriber: Mutex<Subscriber<T>>,
    pending: Mutex<VecDeque<T>>,
}

impl<T> Delivery<T> {
    fn new(subscriber: Subscriber<T>) -> Self {
        Delivery {
            subscriber: Mutex::new(subscriber),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    fn push(&self, event: T, active: &AtomicBool) {
        self.pending.lock().push_back(event);
        loop {
            let Some(mut subscriber) = self.subscriber.try_lock() else {
                trace!("event queued behind an ongoing delivery");
                return;
            };
            loop {
                let next = self.pending.lock().pop_front();
                match next {
                    Some(event) if active.load(Ordering::Acquire) => subscriber.next(event),
                    Some(_) => {}
                    None => break,
                }
            }
            drop(subscriber);
            // An event queued between the last pop and the unlock has nobody
            // left to deliver it.
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }
}

impl<S> Subscribeable for FromEvent<S>
where
    S: EventSource + Send + Sync + 'static,
    S::Event: Clone + Send + 'static,
    S::Kind: Clone + Debug + Send + Sync + 'static,
{
    type ObsType = S::Event;

    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription {
        let delivery = Arc::new(Delivery::new(s));
        match self.attach(Arc::clone(&delivery)) {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(kind = ?self.kind, error = %e, "failed to attach event listener");
                delivery.subscriber.lock().error(Arc::new(e));
                Subscription::closed()
            }
        }
    }
}
