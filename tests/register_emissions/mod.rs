use std::sync::{Arc, Mutex};

use rxsandbox::subscribe::Subscriber;

/// Shared record of everything delivered to the subscribers it hands out.
pub struct Emissions<T> {
    nexts: Arc<Mutex<Vec<T>>>,
    completes: Arc<Mutex<usize>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl<T: Clone + Send + 'static> Emissions<T> {
    pub fn subscriber(&self) -> Subscriber<T> {
        let nexts_c = Arc::clone(&self.nexts);
        let completes_c = Arc::clone(&self.completes);
        let errors_c = Arc::clone(&self.errors);

        Subscriber::new(
            move |n| {
                // Track next() calls.
                nexts_c.lock().unwrap().push(n);
            },
            move |e| {
                // Track error() calls.
                errors_c.lock().unwrap().push(e.to_string());
            },
            move || {
                // Track complete() calls.
                *completes_c.lock().unwrap() += 1;
            },
        )
    }

    pub fn nexts(&self) -> Vec<T> {
        self.nexts.lock().unwrap().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock().unwrap()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

pub fn register_emissions_subscriber<T: Clone + Send + 'static>() -> (Subscriber<T>, Emissions<T>) {
    let emissions = Emissions {
        nexts: Arc::new(Mutex::new(Vec::with_capacity(5))),
        completes: Arc::new(Mutex::new(0)),
        errors: Arc::new(Mutex::new(Vec::new())),
    };
    (emissions.subscriber(), emissions)
}
