use super::*;

use std::error::Error;

use crate::creation::from;
use crate::subscription::subscribe::{SubscriptionHandle, UnsubscribeLogic};

type Recorded<T> = Arc<Mutex<Vec<T>>>;

// Subscriber that records emitted values, completion and errors.
fn recording_subscriber<T: Send + 'static>() -> (
    Subscriber<T>,
    Recorded<T>,
    Arc<AtomicBool>,
    Recorded<Arc<dyn Error + Send + Sync>>,
) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(AtomicBool::new(false));
    let errors = Arc::new(Mutex::new(Vec::new()));

    let values_c = Arc::clone(&values);
    let completed_c = Arc::clone(&completed);
    let errors_c = Arc::clone(&errors);

    let s = Subscriber::new(
        move |v| values_c.lock().push(v),
        move |e| errors_c.lock().push(e),
        move || completed_c.store(true, Ordering::SeqCst),
    );
    (s, values, completed, errors)
}

// Synchronous source that counts how many values it pushed, so tests can see
// whether an operator stopped forwarding.
fn counting_source(values: Vec<i32>, pushed: Arc<Mutex<usize>>) -> Observable<i32> {
    Observable::new(move |mut o: Subscriber<i32>| {
        for v in &values {
            if o.is_stopped() {
                return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
            }
            *pushed.lock() += 1;
            o.next(*v);
        }
        o.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    })
}

const LIST: [i32; 10] = [1, 2, 3, 4, 5, 1, 1, 2, 7, 7];

#[test]
fn map_doubles_values() {
    let (s, values, completed, _) = recording_subscriber();
    from(LIST).map(|v| v * 2).subscribe(s);

    assert_eq!(*values.lock(), vec![2, 4, 6, 8, 10, 2, 2, 4, 14, 14]);
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn filter_keeps_matching_values() {
    let (s, values, _, _) = recording_subscriber();
    from(LIST).filter(|v| *v >= 3).subscribe(s);

    assert_eq!(*values.lock(), vec![3, 4, 5, 7, 7]);
}

#[test]
fn reduce_emits_total_on_completion() {
    let (s, values, completed, _) = recording_subscriber();
    from(LIST).reduce(|acc, v| acc + v, 0).subscribe(s);

    assert_eq!(*values.lock(), vec![33]);
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn reduce_of_empty_source_emits_seed() {
    let (s, values, completed, _) = recording_subscriber();
    from(Vec::<i32>::new()).reduce(|acc, v| acc + v, 42).subscribe(s);

    assert_eq!(*values.lock(), vec![42]);
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn scan_emits_intermediate_totals() {
    let (s, values, _, _) = recording_subscriber();
    from([10, 20, 30, 80]).scan(|acc: i32, v| acc + v, 0).subscribe(s);

    assert_eq!(*values.lock(), vec![10, 30, 60, 140]);
}

#[test]
fn scan_state_is_per_subscription() {
    let mut observable = from([1, 2, 3]).scan(|acc: i32, v| acc + v, 0);

    let (s1, values1, _, _) = recording_subscriber();
    let (s2, values2, _, _) = recording_subscriber();
    observable.subscribe(s1);
    observable.subscribe(s2);

    assert_eq!(*values1.lock(), vec![1, 3, 6]);
    assert_eq!(*values2.lock(), vec![1, 3, 6]);
}

#[test]
fn distinct_drops_repeats() {
    let (s, values, _, _) = recording_subscriber();
    from(LIST).distinct().subscribe(s);

    assert_eq!(*values.lock(), vec![1, 2, 3, 4, 5, 7]);
}

#[test]
fn distinct_by_uses_key() {
    let (s, values, _, _) = recording_subscriber();
    from([(1, "Pat"), (1, "Pit"), (2, "Bin"), (3, "Wil"), (2, "Gin")])
        .distinct_by(|pet: &(i32, &str)| pet.0)
        .subscribe(s);

    assert_eq!(*values.lock(), vec![(1, "Pat"), (2, "Bin"), (3, "Wil")]);
}

#[test]
fn distinct_until_changed_drops_consecutive_repeats() {
    let (s, values, _, _) = recording_subscriber();
    from(LIST).distinct_until_changed().subscribe(s);

    assert_eq!(*values.lock(), vec![1, 2, 3, 4, 5, 1, 2, 7]);
}

#[test]
fn distinct_until_key_changed_compares_keys() {
    let (s, values, _, _) = recording_subscriber();
    from([(1, "Pit"), (1, "Pat"), (2, "Jil"), (2, "Bil"), (3, "Man"), (1, "Min")])
        .distinct_until_key_changed(|pet: &(i32, &str)| pet.0)
        .subscribe(s);

    assert_eq!(
        *values.lock(),
        vec![(1, "Pit"), (2, "Jil"), (3, "Man"), (1, "Min")]
    );
}

#[test]
fn take_completes_after_n_values() {
    let pushed = Arc::new(Mutex::new(0));
    let (s, values, completed, _) = recording_subscriber();

    let subscription = counting_source(LIST.to_vec(), Arc::clone(&pushed))
        .take(3)
        .subscribe(s);

    assert_eq!(*values.lock(), vec![1, 2, 3]);
    assert!(completed.load(Ordering::SeqCst));
    // The source stops pulling once take is done.
    assert_eq!(*pushed.lock(), 3);
    // The synchronous source returned before its subscription existed; take
    // still cancels it afterwards.
    assert!(subscription.is_closed());
}

#[test]
fn stop_reaches_source_through_intermediate_operators() {
    let pushed = Arc::new(Mutex::new(0));
    let (s, values, _, _) = recording_subscriber();

    counting_source(LIST.to_vec(), Arc::clone(&pushed))
        .map(|v| v * 10)
        .filter(|v| *v > 10)
        .first(|_, _| true, None)
        .subscribe(s);

    assert_eq!(*values.lock(), vec![20]);
    assert_eq!(*pushed.lock(), 2);
}

#[test]
fn take_zero_completes_without_subscribing() {
    let pushed = Arc::new(Mutex::new(0));
    let (s, values, completed, _) = recording_subscriber();

    counting_source(LIST.to_vec(), Arc::clone(&pushed))
        .take(0)
        .subscribe(s);

    assert_eq!(*pushed.lock(), 0);
    assert!(values.lock().is_empty());
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn take_while_stops_at_first_failure() {
    let (s, values, completed, _) = recording_subscriber();
    from(LIST).take_while(|v| *v < 5, false).subscribe(s);

    assert_eq!(*values.lock(), vec![1, 2, 3, 4]);
    assert!(completed.load(Ordering::SeqCst));
}

#[test]
fn take_while_inclusive_emits_failing_value() {
    let (s, values, _, _) = recording_subscriber();
    from(LIST).take_while(|v| *v < 5, true).subscribe(s);

    assert_eq!(*values.lock(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn first_emits_first_match() {
    let (s, values, completed, _) = recording_subscriber();
    from(LIST).first(|_, _| true, None).subscribe(s);
    assert_eq!(*values.lock(), vec![1]);
    assert!(completed.load(Ordering::SeqCst));

    let (s, values, _, _) = recording_subscriber();
    from(LIST).first(|v, _| *v > 4, None).subscribe(s);
    assert_eq!(*values.lock(), vec![5]);
}

#[test]
fn first_passes_index_to_predicate() {
    let (s, values, _, _) = recording_subscriber();
    from(LIST).first(|_, i| i == 6, None).subscribe(s);

    assert_eq!(*values.lock(), vec![1]);
}

#[test]
fn first_without_match_uses_default_or_errors() {
    let (s, values, completed, errors) = recording_subscriber();
    from(LIST).first(|v, _| *v > 100, Some(20)).subscribe(s);
    assert_eq!(*values.lock(), vec![20]);
    assert!(completed.load(Ordering::SeqCst));
    assert!(errors.lock().is_empty());

    let (s, values, completed, errors) = recording_subscriber();
    from(LIST).first(|v, _| *v > 100, None).subscribe(s);
    assert!(values.lock().is_empty());
    assert!(!completed.load(Ordering::SeqCst));

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].downcast_ref::<EmptyError>().is_some());
}

#[test]
fn last_emits_last_match_on_completion() {
    let (s, values, completed, _) = recording_subscriber();
    from(LIST).last(|_, _| true, None).subscribe(s);
    assert_eq!(*values.lock(), vec![7]);
    assert!(completed.load(Ordering::SeqCst));

    let (s, values, _, _) = recording_subscriber();
    from([1, 9, 2, 6, 3]).last(|v, _| *v > 4, None).subscribe(s);
    assert_eq!(*values.lock(), vec![6]);
}

#[test]
fn last_of_empty_source_errors() {
    let (s, values, completed, errors) = recording_subscriber();
    from(Vec::<i32>::new()).last(|_, _| true, None).subscribe(s);

    assert!(values.lock().is_empty());
    assert!(!completed.load(Ordering::SeqCst));
    assert!(errors.lock()[0].downcast_ref::<EmptyError>().is_some());
}

#[test]
fn errors_pass_through_operators() {
    let (s, values, completed, errors) = recording_subscriber();

    let mut failing = Observable::new(|mut o: Subscriber<i32>| {
        o.next(1);
        o.error(Arc::new(EmptyError));
        o.next(2);
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    })
    .map(|v| v + 1)
    .filter(|_| true)
    .scan(|acc: i32, v| acc + v, 0);

    failing.subscribe(s);

    assert_eq!(*values.lock(), vec![2]);
    assert!(!completed.load(Ordering::SeqCst));
    assert_eq!(errors.lock().len(), 1);
}
