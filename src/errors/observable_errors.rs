use std::error::Error;

use thiserror::Error;

/// Emitted through `error` by the [`first`] and [`last`] operators when the
/// source completes without a matching item and no default value was given.
///
/// Consumers can recognize it by downcasting the received error:
///
/// ```text
/// observer.on_error(|err| {
///     if err.downcast_ref::<EmptyError>().is_some() { ... }
/// });
/// ```
///
/// [`first`]: ../trait.ObservableExt.html#method.first
/// [`last`]: ../trait.ObservableExt.html#method.last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no elements in sequence")]
pub struct EmptyError;

/// Failure while running the teardown of a [`Subscription`].
///
/// The subscription counts as cancelled even when this is returned; teardown is
/// never attempted a second time.
///
/// [`Subscription`]: ../subscribe/struct.Subscription.html
#[derive(Debug, Error)]
pub enum UnsubscribeError {
    #[error("subscription teardown failed")]
    Teardown(#[source] Box<dyn Error + Send + Sync>),

    #[error("asynchronous teardown requires a Tokio runtime but none was active when subscribing")]
    NoRuntime,
}

/// A source that runs on a `Tokio` task was subscribed outside of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a Tokio runtime is required but none is active")]
pub struct NoRuntimeError;
