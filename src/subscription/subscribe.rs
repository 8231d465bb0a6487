use std::{
    any::Any,
    error::Error,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle as ThreadJoinHandle,
};

use parking_lot::Mutex;
use tokio::runtime;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{errors::UnsubscribeError, observer::Observer};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by a sequence.
pub trait Subscribeable {
    /// The type of items emitted by the sequence.
    type ObsType;

    /// Subscribes to the sequence and specifies how to handle emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values
    /// emitted by the sequence. The returned `Subscription` allows the caller to
    /// cancel the attachment or, for sources running on a thread or a `Tokio`
    /// task, to wait for them.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, releasing whatever the
/// subscription holds on the source side.
pub trait Unsubscribeable {
    /// Cancels the subscription.
    ///
    /// Teardown faults are logged and otherwise ignored. Use
    /// [`Subscription::try_unsubscribe`] when the caller needs to see them.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send>;

/// A type that acts as an observer, allowing users to handle emitted values,
/// errors, and completion when subscribing to a sequence.
///
/// Once `complete` or `error` has been delivered the subscriber is stopped and
/// ignores every later notification.
///
/// Subscribers that operators create for their upstream share a flag with the
/// final subscriber of the chain. A synchronous source can poll
/// [`is_stopped`] to stop producing once the end of the chain is done, for
/// example after a `take`.
///
/// [`is_stopped`]: #method.is_stopped
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    stopped: bool,
    chain_stopped: Arc<AtomicBool>,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` instance with custom handling functions for
    /// emitted values, errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            stopped: false,
            chain_stopped: Arc::default(),
        }
    }

    /// Create a new Subscriber with only the provided `next` function.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            stopped: false,
            chain_stopped: Arc::default(),
        }
    }

    /// Set the completion function for the Subscriber.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Set the error-handling function for the Subscriber.
    ///
    /// The closure receives the error as an `Arc` wrapping a trait object, which
    /// can be downcast to the concrete error type.
    pub fn on_error(&mut self, error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns `true` once `complete` or `error` has been delivered to this
    /// subscriber or to the end of the operator chain it feeds.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped || self.chain_stopped.load(Ordering::Acquire)
    }

    pub(crate) fn chain(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.chain_stopped)
    }

    /// Joins this subscriber to the chain of the subscriber it forwards to.
    pub(crate) fn chained(mut self, chain: Arc<AtomicBool>) -> Self {
        self.chain_stopped = chain;
        self
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.chain_stopped.store(true, Ordering::Release);
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.stopped {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.stopped {
            return;
        }
        self.stop();
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, observable_error: Arc<dyn Error + Send + Sync>) {
        if self.stopped {
            return;
        }
        self.stop();
        if let Some(efn) = &mut self.error_fn {
            (efn)(observable_error);
        }
    }
}

/// Enumeration representing different types of handles used to await sources
/// that run in the background.
pub enum SubscriptionHandle {
    /// No specific handle for task or thread awaiting.
    Nil,

    /// Holds a join handle for awaiting a source running on a `Tokio` task.
    JoinTask(JoinHandle<()>),

    /// Holds a join handle for awaiting a source running on an OS thread.
    JoinThread(ThreadJoinHandle<()>),
}

/// Enumerates the teardown strategies of a subscription.
pub enum UnsubscribeLogic {
    /// Nothing to release.
    Nil,

    /// If one subscription depends on another. The wrapped subscription is
    /// cancelled upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Teardown defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Teardown defined by a function that can fail, such as removing a
    /// listener from an event source.
    Fallible(Box<dyn FnOnce() -> Result<(), UnsubscribeError> + Send>),

    /// Asynchronous teardown represented by a future. It is spawned on the
    /// `Tokio` runtime that was current when the subscription was created.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn run(self, runtime_handle: Option<runtime::Handle>) -> Result<(), UnsubscribeError> {
        match self {
            UnsubscribeLogic::Nil => Ok(()),
            UnsubscribeLogic::Logic(fnc) => {
                fnc();
                Ok(())
            }
            UnsubscribeLogic::Fallible(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.try_unsubscribe(),
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Some(handle) => {
                    handle.spawn(future);
                    Ok(())
                }
                None => Err(UnsubscribeError::NoRuntime),
            },
        }
    }
}

struct SubscriptionState {
    // `None` once cancelled.
    unsubscribe_logic: Option<UnsubscribeLogic>,
    subscription_future: SubscriptionHandle,
    runtime_handle: Option<runtime::Handle>,
}

type AwaitResult = Result<(), Box<dyn Any + Send>>;

/// Represents one attachment to a sequence, allowing the caller to cancel it.
///
/// A subscription is either active or cancelled. Cancelling runs the teardown
/// exactly once; every later cancel, through this handle or any of its clones,
/// does nothing.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<Mutex<SubscriptionState>>,
}

impl Subscription {
    /// Creates a new Subscription instance with the specified unsubscribe logic
    /// and subscription handle.
    ///
    /// See [`UnsubscribeLogic`] for the available teardown strategies and
    /// [`SubscriptionHandle`] for the handles that can be awaited.
    ///
    /// [`UnsubscribeLogic`]: enum.UnsubscribeLogic.html
    /// [`SubscriptionHandle`]: enum.SubscriptionHandle.html
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic, subscription_future: SubscriptionHandle) -> Self {
        Subscription {
            state: Arc::new(Mutex::new(SubscriptionState {
                unsubscribe_logic: Some(unsubscribe_logic),
                subscription_future,
                runtime_handle: runtime::Handle::try_current().ok(),
            })),
        }
    }

    /// Creates a subscription that is already cancelled.
    #[must_use]
    pub fn closed() -> Self {
        Subscription {
            state: Arc::new(Mutex::new(SubscriptionState {
                unsubscribe_logic: None,
                subscription_future: SubscriptionHandle::Nil,
                runtime_handle: None,
            })),
        }
    }

    /// Returns `true` once the subscription has been cancelled.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().unsubscribe_logic.is_none()
    }

    /// Cancels the subscription and reports a teardown fault to the caller.
    ///
    /// Only the first call runs the teardown; later calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by a failing teardown, or
    /// [`UnsubscribeError::NoRuntime`] for asynchronous teardown created outside
    /// of a `Tokio` runtime.
    pub fn try_unsubscribe(&self) -> Result<(), UnsubscribeError> {
        let (logic, runtime_handle) = {
            let mut state = self.state.lock();
            match state.unsubscribe_logic.take() {
                Some(logic) => (logic, state.runtime_handle.clone()),
                None => return Ok(()),
            }
        };
        debug!("running subscription teardown");
        logic.run(runtime_handle)
    }

    /// Awaits the completion of the `Tokio` task or OS thread associated with
    /// this subscription.
    ///
    /// Only one of the cloned handles gets to wait; the others return at once.
    ///
    /// # Errors
    ///
    /// Returns an error if joining the thread or awaiting the task fails.
    pub async fn join_concurrent(self) -> AwaitResult {
        match self.take_handle() {
            SubscriptionHandle::JoinTask(task_handle) => task_handle
                .await
                .map_err(|e| Box::new(e) as Box<dyn Any + Send>),
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    /// Blocks until the OS thread associated with this subscription finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if joining the thread fails, or if the source runs on a
    /// `Tokio` task, which has to be awaited with `join_concurrent().await`.
    pub fn join(self) -> AwaitResult {
        match self.take_handle() {
            SubscriptionHandle::JoinThread(thread_handle) => thread_handle.join(),
            SubscriptionHandle::Nil => Ok(()),
            task @ SubscriptionHandle::JoinTask(_) => {
                // Keep the handle so `join_concurrent` can still be used.
                self.state.lock().subscription_future = task;
                Err(Box::new(
                    "source runs on a Tokio task, use `join_concurrent().await` instead",
                ) as Box<dyn Any + Send>)
            }
        }
    }

    fn take_handle(&self) -> SubscriptionHandle {
        std::mem::replace(&mut self.state.lock().subscription_future, SubscriptionHandle::Nil)
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        if let Err(e) = self.try_unsubscribe() {
            warn!(error = %e, "subscription teardown failed");
        }
    }
}
