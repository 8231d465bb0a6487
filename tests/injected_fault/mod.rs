use thiserror::Error;

/// Fault injected by test sources.
#[derive(Debug, Error)]
#[error("injected source fault")]
pub struct InjectedFault;
