//! Creation operators: functions that build an [`Observable`] from plain values
//! or from time.
//!
//! Event sources are adapted by [`from_event`] in the `event` module.
//!
//! [`Observable`]: ../struct.Observable.html
//! [`from_event`]: ../../event/fn.from_event.html

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{runtime, time};
use tracing::debug;

use crate::{
    errors::NoRuntimeError,
    observer::Observer,
    subscription::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable,
};

/// Emits `value` once and completes.
///
/// A collection passed here is emitted as a single item. Use [`from`], or the
/// [`of!`] macro, to emit several values one by one.
///
/// [`from`]: fn.from.html
/// [`of!`]: ../macro.of.html
pub fn of<T>(value: T) -> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    Observable::new(move |mut o: Subscriber<T>| {
        o.next(value.clone());
        o.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    })
}

/// Emits each argument in order and completes.
///
/// `of!(10, 20, 30)` is shorthand for `from([10, 20, 30])`.
///
/// ```no_run
/// use rxsandbox::{of, subscribe::Subscriber, Subscribeable};
///
/// of!(10, 20, 30).subscribe(Subscriber::on_next(|v: i32| println!("{}", v)));
/// ```
#[macro_export]
macro_rules! of {
    ($($value:expr),+ $(,)?) => {
        $crate::creation::from([$($value),+])
    };
}

/// Emits every item of `values` in order and completes.
///
/// Nothing is pulled from `values` until a subscriber attaches. Every
/// subscription iterates its own clone of `values`, and stops pulling as soon
/// as the end of the operator chain is done, so unbounded iterators can be
/// used together with `take`, `take_while` or `first`.
pub fn from<I>(values: I) -> Observable<I::Item>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::Item: 'static,
{
    Observable::new(move |mut o: Subscriber<I::Item>| {
        let mut items = values.clone().into_iter();
        while !o.is_stopped() {
            match items.next() {
                Some(v) => o.next(v),
                None => o.complete(),
            }
        }
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    })
}

/// Emits `0, 1, 2, ...` on a `Tokio` task, one value per `period`, starting one
/// period after subscribing.
///
/// The sequence never completes on its own. Unsubscribing stops the task at its
/// next tick, and nothing is emitted after the unsubscribe. Subscribing outside
/// of a `Tokio` runtime delivers [`NoRuntimeError`] to the subscriber.
///
/// [`NoRuntimeError`]: ../../struct.NoRuntimeError.html
pub fn interval(period: Duration) -> Observable<u64> {
    // Tokio intervals panic on a zero period.
    let period = period.max(Duration::from_millis(1));

    Observable::new(move |mut o: Subscriber<u64>| {
        let handle = match runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                o.error(Arc::new(NoRuntimeError));
                return Subscription::closed();
            }
        };

        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_c = Arc::clone(&stopped);

        let join_handle = handle.spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            let mut i = 0;
            loop {
                ticker.tick().await;
                if stopped_c.load(Ordering::SeqCst) || o.is_stopped() {
                    break;
                }
                o.next(i);
                i += 1;
            }
            debug!(emitted = i, "interval stopped");
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                stopped.store(true, Ordering::SeqCst);
            })),
            SubscriptionHandle::JoinTask(join_handle),
        )
    })
}
