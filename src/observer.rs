use std::{error::Error, sync::Arc};

/// Receiving side of a sequence.
///
/// A well-behaved producer calls `next` zero or more times and then at most one
/// of `error` or `complete`.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: Arc<dyn Error + Send + Sync>);
}
