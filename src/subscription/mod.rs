//! Provides structures and traits related to subscription management.
//!
//! This module includes `Subscriber` for handling observed values, errors and
//! completion, and `Subscription` for cancelling an attachment to a sequence
//! and awaiting sources that run in the background.
pub mod subscribe;
