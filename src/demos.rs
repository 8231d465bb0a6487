//! Demonstration pipelines run by the `rxsandbox` binary.
//!
//! Every demo subscribes its pipelines and returns the lines they produced, so
//! the binary can print them and the tests can check them.

use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::runtime;
use tracing::{debug, info};

use rxsandbox::{
    creation::{from, interval, of},
    event::{from_event, EventTarget},
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    NoRuntimeError, Observable, ObservableExt, Observer, Subscribeable, Unsubscribeable,
};

const NUMBERS: [i32; 10] = [1, 2, 3, 4, 5, 1, 1, 2, 7, 7];

/// Default for how long the event demo stays subscribed, in milliseconds.
pub const DEFAULT_UNSUBSCRIBE_MS: u64 = 3000;

/// Settings shared by the demos.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    /// Texts up to this length are dropped by the input pipeline.
    pub min_length: usize,
    /// How long the event demo stays subscribed.
    pub unsubscribe_after: Duration,
    /// Period of the interval and observer demos.
    pub tick: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            min_length: 5,
            unsubscribe_after: Duration::from_millis(DEFAULT_UNSUBSCRIBE_MS),
            tick: Duration::from_millis(100),
        }
    }
}

#[derive(Clone, Default)]
struct Lines(Arc<Mutex<Vec<String>>>);

impl Lines {
    fn push(&self, line: impl Into<String>) {
        self.0.lock().push(line.into());
    }

    fn subscriber<T: Display + 'static>(&self, label: &'static str) -> Subscriber<T> {
        let next = self.clone();
        let error = self.clone();
        let complete = self.clone();
        Subscriber::new(
            move |v: T| next.push(format!("{}: {}", label, v)),
            move |e| error.push(format!("{} failed: {}", label, e)),
            move || complete.push(format!("{} complete", label)),
        )
    }

    fn into_vec(self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

pub fn creation() -> Vec<String> {
    let lines = Lines::default();

    of("Hello").subscribe(lines.subscriber("of"));
    rxsandbox::of!(10, 20, 30).subscribe(lines.subscriber("of many"));
    of(vec![1, 2, 3])
        .map(|list| format!("{:?}", list))
        .subscribe(lines.subscriber("of list"));
    from(["Hello", "World"]).subscribe(lines.subscriber("from"));

    lines.into_vec()
}

// Hand-built observable: emits 100 at once, then one value per `period` on a
// Tokio task, and completes after ten ticks. Unsubscribing clears the timer.
fn ticking_observable(period: Duration) -> Observable<u32> {
    Observable::new(move |mut o: Subscriber<u32>| {
        o.next(100);

        let Ok(handle) = runtime::Handle::try_current() else {
            o.error(Arc::new(NoRuntimeError));
            return Subscription::closed();
        };

        let cleared = Arc::new(AtomicBool::new(false));
        let cleared_c = Arc::clone(&cleared);

        let task = handle.spawn(async move {
            let mut timer = tokio::time::interval(period);
            // The first tick completes immediately.
            timer.tick().await;
            for counter in 0..=10 {
                timer.tick().await;
                if cleared_c.load(Ordering::SeqCst) {
                    debug!(counter, "timer cleared");
                    return;
                }
                if counter < 10 {
                    o.next(counter + 1);
                } else {
                    o.complete();
                }
            }
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                cleared.store(true, Ordering::SeqCst);
            })),
            SubscriptionHandle::JoinTask(task),
        )
    })
}

pub async fn observer(config: &DemoConfig) -> Vec<String> {
    let lines = Lines::default();

    let subscription = ticking_observable(config.tick).subscribe(lines.subscriber("observer"));
    if let Err(e) = subscription.join_concurrent().await {
        lines.push(format!("observer task failed: {:?}", e));
    }

    lines.into_vec()
}

#[derive(Clone, Debug)]
struct CartItem {
    name: &'static str,
    cost: f64,
}

#[derive(Clone, Debug)]
struct User {
    name: &'static str,
    is_admin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Pet {
    id: u32,
    name: &'static str,
}

pub fn operators() -> Vec<String> {
    let lines = Lines::default();
    let numbers = || from(NUMBERS);

    numbers().map(|v| v * 2).subscribe(lines.subscriber("map"));
    numbers().filter(|v| *v >= 3).subscribe(lines.subscriber("filter"));
    numbers()
        .reduce(|total, v| total + v, 0)
        .subscribe(lines.subscriber("reduce"));
    numbers()
        .scan(|total, v| total + v, 0)
        .subscribe(lines.subscriber("scan"));

    let cart = [
        CartItem { name: "notebook", cost: 12.5 },
        CartItem { name: "pen", cost: 1.25 },
        CartItem { name: "lamp", cost: 30.0 },
    ];
    from(cart.clone())
        .reduce(|total, item| total + item.cost, 0.0)
        .subscribe(lines.subscriber("cart total"));
    from(cart)
        .scan(|total, item| total + item.cost, 0.0)
        .subscribe(lines.subscriber("cart running total"));

    let users = [
        User { name: "Ann", is_admin: true },
        User { name: "Bob", is_admin: false },
        User { name: "Cy", is_admin: true },
    ];
    from(users)
        .filter(|user| user.is_admin)
        .map(|user| user.name)
        .subscribe(lines.subscriber("admins"));

    numbers().distinct().subscribe(lines.subscriber("distinct"));
    let pets = [
        Pet { id: 1, name: "Tom" },
        Pet { id: 2, name: "Garfield" },
        Pet { id: 1, name: "Tom" },
        Pet { id: 3, name: "Felix" },
    ];
    from(pets)
        .distinct_by(|pet| pet.id)
        .map(|pet| pet.name)
        .subscribe(lines.subscriber("distinct pets"));

    numbers()
        .distinct_until_changed()
        .subscribe(lines.subscriber("distinct until changed"));
    let visits = [
        Pet { id: 1, name: "Tom" },
        Pet { id: 1, name: "Tommy" },
        Pet { id: 2, name: "Garfield" },
        Pet { id: 1, name: "Tom" },
    ];
    from(visits)
        .distinct_until_key_changed(|pet| pet.id)
        .map(|pet| pet.name)
        .subscribe(lines.subscriber("distinct until key changed"));

    numbers().take(3).subscribe(lines.subscriber("take"));
    numbers()
        .take_while(|v| *v < 5, false)
        .subscribe(lines.subscriber("take while"));
    numbers()
        .first(|_, _| true, None)
        .subscribe(lines.subscriber("first"));
    numbers()
        .first(|v, _| *v > 4, None)
        .subscribe(lines.subscriber("first > 4"));
    numbers()
        .last(|_, _| true, None)
        .subscribe(lines.subscriber("last"));
    numbers()
        .last(|v, _| *v > 4, None)
        .subscribe(lines.subscriber("last > 4"));

    lines.into_vec()
}

/// Text field pipeline: values longer than `min_length`, without repeats.
pub fn input(config: &DemoConfig) -> Vec<String> {
    let lines = Lines::default();
    let field: Arc<EventTarget<String>> = Arc::new(EventTarget::with_kinds(["input".to_string()]));

    let min_length = config.min_length;
    let subscription = from_event(Arc::clone(&field), "input")
        .map(|text: String| text.trim().to_string())
        .filter(move |text| text.len() > min_length)
        .distinct_until_changed()
        .subscribe(lines.subscriber("input"));

    for typed in ["r", "ru", "rust", "rustac", "rustace", "rustace ", "rustacean"] {
        field.dispatch("input", &typed.to_string());
    }

    subscription.unsubscribe();
    field.dispatch("input", &"after unsubscribe".to_string());
    lines.push(format!(
        "input listeners after unsubscribe: {}",
        field.listener_count("input")
    ));

    lines.into_vec()
}

/// Text field and button observed at the same time, both released after
/// `unsubscribe_after`.
pub async fn events(config: &DemoConfig) -> Vec<String> {
    let lines = Lines::default();
    let field: Arc<EventTarget<String>> = Arc::new(EventTarget::with_kinds(["input".to_string()]));
    let button: Arc<EventTarget<(i32, i32)>> = Arc::new(EventTarget::with_kinds(["click".to_string()]));

    let typing = from_event(Arc::clone(&field), "input").subscribe(lines.subscriber("input"));
    let clicks = from_event(Arc::clone(&button), "click")
        .map(|(x, y)| format!("({}, {})", x, y))
        .subscribe(lines.subscriber("click"));

    field.dispatch("input", &"hello".to_string());
    button.dispatch("click", &(10, 20));
    field.dispatch("input", &"hello there".to_string());

    info!(after = ?config.unsubscribe_after, "waiting before unsubscribing");
    tokio::time::sleep(config.unsubscribe_after).await;
    typing.unsubscribe();
    clicks.unsubscribe();

    field.dispatch("input", &"too late".to_string());
    button.dispatch("click", &(0, 0));
    lines.push(format!(
        "listeners after unsubscribe: input {}, click {}",
        field.listener_count("input"),
        button.listener_count("click")
    ));

    lines.into_vec()
}

pub async fn ticks(config: &DemoConfig) -> Vec<String> {
    let lines = Lines::default();

    let subscription = interval(config.tick)
        .take_while(|v| *v < 10, true)
        .subscribe(lines.subscriber("interval"));
    if let Err(e) = subscription.join_concurrent().await {
        lines.push(format!("interval task failed: {:?}", e));
    }

    lines.into_vec()
}
