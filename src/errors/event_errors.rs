use std::error::Error;

use thiserror::Error;

/// Registration fault reported by an [`EventSource`].
///
/// [`EventSource`]: ../event/trait.EventSource.html
#[derive(Debug, Error)]
pub enum EventError {
    /// The source does not raise events of this kind.
    #[error("event kind {0} is not supported by this source")]
    UnsupportedKind(String),

    /// The source was closed and no longer accepts listeners.
    #[error("event source is closed")]
    Closed,

    /// Fault raised by a foreign event source implementation.
    #[error("event source fault")]
    Source(#[source] Box<dyn Error + Send + Sync>),
}
