use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use rxsandbox::{
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable, Observer,
};

/// Emits `0..=end` from an OS thread, one value per millisecond, and calls
/// `last_emit_assert` with the last value it emitted once it stops.
pub fn generate_u32_observable(
    end: u32,
    last_emit_assert: impl FnMut(u32) + Send + Sync + 'static,
) -> Observable<u32> {
    let last_emit_assert = Arc::new(Mutex::new(last_emit_assert));

    Observable::new(move |mut o: Subscriber<_>| {
        let done = Arc::new(AtomicBool::new(false));
        let done_c = Arc::clone(&done);

        let last_emit_assert = Arc::clone(&last_emit_assert);
        let jh = std::thread::spawn(move || {
            let mut last_emit = 0;

            for i in 0..=end {
                if done.load(Ordering::SeqCst) {
                    break;
                }
                last_emit = i;
                o.next(i);
                // Important. Give the unsubscribe signal a chance to land.
                std::thread::sleep(Duration::from_millis(1));
            }
            if !done.load(Ordering::SeqCst) {
                o.complete();
            }
            last_emit_assert.lock().unwrap()(last_emit);
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                done_c.store(true, Ordering::SeqCst);
            })),
            SubscriptionHandle::JoinThread(jh),
        )
    })
}
