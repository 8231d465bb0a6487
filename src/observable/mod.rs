//! The `observable` module provides the building blocks for creating and
//! transforming sequences.

use std::{
    collections::HashSet,
    hash::Hash,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use crate::errors::EmptyError;
use crate::observer::Observer;
use crate::subscription::subscribe::{
    Subscribeable, Subscriber, Subscription, Unsubscribeable,
};

pub mod creation;

/// The `Observable` struct represents a cold source of values that can be
/// observed and transformed.
///
/// Nothing happens until `subscribe` is called, and every subscription runs the
/// subscribe function again, so each subscriber gets its own independent
/// execution.
///
/// ```no_run
/// use rxsandbox::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
/// use rxsandbox::{Observable, ObservableExt, Observer, Subscribeable};
///
/// let mut emit_10_observable = Observable::new(|mut subscriber: Subscriber<i32>| {
///     for i in 1..=10 {
///         subscriber.next(i);
///     }
///     subscriber.complete();
///
///     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
/// });
///
/// let observer = Subscriber::new(
///     |v| println!("Emitted {}", v),
///     |e| eprintln!("Error {}", e),
///     || println!("Completed"),
/// );
///
/// emit_10_observable
///     .filter(|v| v % 2 == 0)
///     .map(|v| v * 10)
///     .subscribe(observer);
/// ```
pub struct Observable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send + Sync>,
}

impl<T> Observable<T> {
    /// Creates a new `Observable` with the provided subscribe function.
    ///
    /// The function is invoked once per subscription to deliver values to the
    /// `Subscriber`. It returns the `Subscription` that cancels that delivery
    /// and, for sources running on a thread or a `Tokio` task, lets the caller
    /// wait for them.
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Box::new(sf),
        }
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        (self.subscribe_fn)(v)
    }
}

// Upstream subscription of an operator that can finish before its source does.
//
// The source may finish synchronously inside `subscribe`, before its
// subscription exists; the release is then applied once `attach` receives it.
#[derive(Clone, Default)]
struct Upstream {
    slot: Arc<Mutex<Option<Subscription>>>,
    released: Arc<AtomicBool>,
}

impl Upstream {
    fn attach(&self, subscription: Subscription) -> Subscription {
        *self.slot.lock() = Some(subscription.clone());
        if self.released.load(Ordering::SeqCst) {
            self.release();
        }
        subscription
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        let subscription = self.slot.lock().take();
        if let Some(s) = subscription {
            s.unsubscribe();
        }
    }
}

/// The `ObservableExt` trait provides the pipeable operators.
///
/// It is implemented for every `Subscribeable`, so operators can be chained on
/// an `Observable` as well as on an event sequence created by `from_event`.
/// Every operator returns a new cold `Observable`; per-subscription state such
/// as accumulators or seen-sets is created when that observable is subscribed.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Transforms the items emitted by the observable using a transformation
    /// function.
    fn map<U, F>(mut self, f: F) -> Observable<U>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
        U: 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o: Subscriber<U>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let u = Subscriber::new(
                move |v: T| {
                    let t = f(v);
                    o_shared.lock().next(t);
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Filters the items emitted by the observable based on a predicate
    /// function.
    ///
    /// Only items for which the predicate returns `true` are emitted.
    fn filter<P>(mut self, predicate: P) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let u = Subscriber::new(
                move |v: T| {
                    if predicate(&v) {
                        o_shared.lock().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Applies an accumulator over the source and emits the accumulated result
    /// once the source completes, followed by completion.
    ///
    /// The accumulation starts from `seed`; a source that completes without
    /// emitting produces `seed` itself.
    fn reduce<R, F>(mut self, f: F, seed: R) -> Observable<R>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(R, T) -> R + Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o: Subscriber<R>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let acc = Arc::new(Mutex::new(Some(seed.clone())));
            let acc_c = Arc::clone(&acc);

            let u = Subscriber::new(
                move |v: T| {
                    let mut state = acc.lock();
                    if let Some(current) = state.take() {
                        *state = Some(f(current, v));
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let total = acc_c.lock().take();
                    let mut o = o_shared.lock();
                    if let Some(total) = total {
                        o.next(total);
                    }
                    o.complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Like [`reduce`], but emits every intermediate accumulation.
    ///
    /// [`reduce`]: #method.reduce
    fn scan<R, F>(mut self, f: F, seed: R) -> Observable<R>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(R, T) -> R + Send + Sync + 'static,
        R: Clone + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Observable::new(move |o: Subscriber<R>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let f = Arc::clone(&f);

            let mut acc = Some(seed.clone());
            let u = Subscriber::new(
                move |v: T| {
                    if let Some(current) = acc.take() {
                        let next = f(current, v);
                        acc = Some(next.clone());
                        o_shared.lock().next(next);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Emits only items that were never emitted before in this subscription.
    fn distinct(self) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: Eq + Hash + Clone + Send,
    {
        self.distinct_by(|v: &T| v.clone())
    }

    /// Emits only items whose key, selected by `key`, was never seen before in
    /// this subscription.
    fn distinct_by<K, F>(mut self, key: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Eq + Hash + Send + 'static,
    {
        let key = Arc::new(key);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let key = Arc::clone(&key);

            let mut seen = HashSet::new();
            let u = Subscriber::new(
                move |v: T| {
                    if seen.insert(key(&v)) {
                        o_shared.lock().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Suppresses items equal to the item emitted just before them.
    fn distinct_until_changed(self) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        T: PartialEq + Clone + Send,
    {
        self.distinct_until_changed_by(|previous: &T, current: &T| previous == current)
    }

    /// Suppresses items that `eq` considers equal to the item emitted just
    /// before them.
    fn distinct_until_changed_by<F>(mut self, eq: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
        T: Clone + Send,
    {
        let eq = Arc::new(eq);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let eq = Arc::clone(&eq);

            let mut previous: Option<T> = None;
            let u = Subscriber::new(
                move |v: T| {
                    let changed = match &previous {
                        Some(p) => !eq(p, &v),
                        None => true,
                    };
                    if changed {
                        previous = Some(v.clone());
                        o_shared.lock().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Suppresses items whose key equals the key of the item emitted just
    /// before them.
    fn distinct_until_key_changed<K, F>(mut self, key: F) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: PartialEq + Send + 'static,
    {
        let key = Arc::new(key);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let key = Arc::clone(&key);

            let mut previous_key: Option<K> = None;
            let u = Subscriber::new(
                move |v: T| {
                    let k = key(&v);
                    if previous_key.as_ref() != Some(&k) {
                        previous_key = Some(k);
                        o_shared.lock().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            self.subscribe(u.chained(chain))
        })
    }

    /// Emits at most the first `n` items emitted by the observable, then
    /// completes and unsubscribes from the source.
    ///
    /// `take(0)` completes without subscribing to the source at all.
    fn take(mut self, n: usize) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            if n == 0 {
                o_shared.lock().complete();
                return Subscription::closed();
            }
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let upstream = Upstream::default();
            let release = upstream.clone();

            let mut taken = 0;
            let u = Subscriber::new(
                move |v: T| {
                    if taken >= n {
                        return;
                    }
                    taken += 1;
                    let mut o = o_shared.lock();
                    o.next(v);
                    if taken == n {
                        o.complete();
                        drop(o);
                        release.release();
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            upstream.attach(self.subscribe(u.chained(chain)))
        })
    }

    /// Emits items as long as `predicate` holds, then completes and
    /// unsubscribes from the source.
    ///
    /// When `inclusive` is `true` the first item failing the predicate is
    /// emitted before completing.
    fn take_while<P>(mut self, predicate: P, inclusive: bool) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let upstream = Upstream::default();
            let release = upstream.clone();

            let mut done = false;
            let u = Subscriber::new(
                move |v: T| {
                    if done {
                        return;
                    }
                    if predicate(&v) {
                        o_shared.lock().next(v);
                        return;
                    }
                    done = true;
                    let mut o = o_shared.lock();
                    if inclusive {
                        o.next(v);
                    }
                    o.complete();
                    drop(o);
                    release.release();
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().complete();
                },
            );
            upstream.attach(self.subscribe(u.chained(chain)))
        })
    }

    /// Emits the first item satisfying `predicate`, then completes and
    /// unsubscribes from the source.
    ///
    /// The predicate also receives the zero-based index of the item. If the
    /// source completes without a match, `default` is emitted instead; without
    /// a default the observable errors with [`EmptyError`].
    ///
    /// [`EmptyError`]: ../struct.EmptyError.html
    fn first<P>(mut self, predicate: P, default: Option<T>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T, usize) -> bool + Send + Sync + 'static,
        T: Clone + Send + Sync,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let upstream = Upstream::default();
            let release = upstream.clone();

            let found = Arc::new(AtomicBool::new(false));
            let found_c = Arc::clone(&found);
            let mut default = default.clone();

            let mut index = 0;
            let u = Subscriber::new(
                move |v: T| {
                    if found.load(Ordering::SeqCst) {
                        return;
                    }
                    let matched = predicate(&v, index);
                    index += 1;
                    if matched {
                        found.store(true, Ordering::SeqCst);
                        let mut o = o_shared.lock();
                        o.next(v);
                        o.complete();
                        drop(o);
                        release.release();
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    if found_c.load(Ordering::SeqCst) {
                        return;
                    }
                    let mut o = o_cloned_c.lock();
                    match default.take() {
                        Some(v) => {
                            o.next(v);
                            o.complete();
                        }
                        None => o.error(Arc::new(EmptyError)),
                    }
                },
            );
            upstream.attach(self.subscribe(u.chained(chain)))
        })
    }

    /// Emits the last item satisfying `predicate` once the source completes.
    ///
    /// The predicate also receives the zero-based index of the item. Without a
    /// match `default` is emitted; without a default the observable errors with
    /// [`EmptyError`].
    ///
    /// [`EmptyError`]: ../struct.EmptyError.html
    fn last<P>(mut self, predicate: P, default: Option<T>) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        P: Fn(&T, usize) -> bool + Send + Sync + 'static,
        T: Clone + Send + Sync,
    {
        let predicate = Arc::new(predicate);
        Observable::new(move |o: Subscriber<T>| {
            let chain = o.chain();
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let predicate = Arc::clone(&predicate);

            let last = Arc::new(Mutex::new(None));
            let last_c = Arc::clone(&last);
            let mut default = default.clone();

            let mut index = 0;
            let u = Subscriber::new(
                move |v: T| {
                    if predicate(&v, index) {
                        *last.lock() = Some(v);
                    }
                    index += 1;
                },
                move |observable_error| {
                    o_cloned_e.lock().error(observable_error);
                },
                move || {
                    let value = last_c.lock().take().or_else(|| default.take());
                    let mut o = o_shared.lock();
                    match value {
                        Some(v) => {
                            o.next(v);
                            o.complete();
                        }
                        None => o.error(Arc::new(EmptyError)),
                    }
                },
            );
            self.subscribe(u.chained(chain))
        })
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}

#[cfg(test)]
mod tests;
