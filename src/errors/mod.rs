//! Error types produced by subscriptions, operators and event sources.

mod event_errors;
mod observable_errors;

pub use event_errors::*;
pub use observable_errors::*;
