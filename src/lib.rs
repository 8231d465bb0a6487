//! `rxsandbox` turns listener-based event sources into cancellable, push-based
//! sequences, and provides a small set of reactive operators to shape them.
//!
//! The central pieces are:
//!
//! - [`Observable`]: a cold sequence built from a subscribe function, created
//!   directly or with the [`creation`] operators `of`, `from` and `interval`.
//! - [`from_event`]: adapts any [`EventSource`] (something with add/remove
//!   listener operations) into a sequence. Each subscription owns exactly one
//!   listener registration and cancelling it removes exactly that listener.
//! - [`ObservableExt`]: pipeable operators such as `map`, `filter`, `scan`,
//!   `distinct_until_changed`, `take_while` or `first`.
//! - [`Subscriber`] and [`Subscription`]: the consumer's handlers and the
//!   handle used to cancel an attachment. Cancelling is idempotent.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rxsandbox::{
//!     event::{from_event, EventTarget},
//!     subscribe::{Subscriber, Unsubscribeable},
//!     ObservableExt, Subscribeable,
//! };
//!
//! let button: Arc<EventTarget<u32>> = Arc::new(EventTarget::with_kinds(["click".to_string()]));
//!
//! let clicks = from_event(Arc::clone(&button), "click")
//!     .scan(|count, _| count + 1, 0)
//!     .subscribe(Subscriber::on_next(|count: u32| println!("clicked {} times", count)));
//!
//! button.dispatch("click", &1);
//! button.dispatch("click", &2);
//!
//! clicks.unsubscribe();
//! ```
//!
//! [`Observable`]: struct.Observable.html
//! [`creation`]: creation/index.html
//! [`from_event`]: event/fn.from_event.html
//! [`EventSource`]: event/trait.EventSource.html
//! [`ObservableExt`]: trait.ObservableExt.html
//! [`Subscriber`]: subscribe/struct.Subscriber.html
//! [`Subscription`]: subscribe/struct.Subscription.html

mod errors;
pub mod event;
mod observable;
mod observer;
mod subscription;

pub use errors::*;
pub use observable::*;
pub use observer::Observer;
pub use subscription::*;

pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
