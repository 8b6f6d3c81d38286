//! # Example: channel
//!
//! Synchronous multicast with an [`EventChannel`].
//!
//! Demonstrates how to:
//! - Subscribe plain handlers and bound `(instance, method)` pairs.
//! - Use one-shot subscriptions.
//! - Remove subscriptions by handler, by method, or by instance.
//! - Unsubscribe from inside a running handler.
//!
//! ## Flow
//! ```text
//! emit("boot")  ─► logger ─► meter.count ─► meter.last ─► once-greeter
//! emit("tick")  ─► logger ─► meter.count ─► meter.last ─► self-remover (drops logger)
//! emit("tick")  ─► meter.count ─► meter.last
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example channel
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tidings::{handler, EventChannel};

/// Receiver with two methods bound to the same instance.
#[derive(Default)]
struct Meter {
    seen: AtomicUsize,
    last: Mutex<String>,
}

impl Meter {
    fn count(&self, _ev: &String) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }

    fn last(&self, ev: &String) {
        *self.last.lock().unwrap() = ev.clone();
    }
}

fn main() {
    let chan = Arc::new(EventChannel::<String>::new());

    // 1. Plain handler
    let logger = handler(|ev: &String| println!("[logger] {ev}"));
    chan.subscribe(Arc::clone(&logger));

    // 2. Two methods of one instance
    let meter = Arc::new(Meter::default());
    chan.subscribe_method(&meter, Meter::count);
    chan.subscribe_method(&meter, Meter::last);

    // 3. One-shot greeter
    chan.subscribe_once(handler(|ev: &String| println!("[greeter] first event: {ev}")));

    chan.emit(&"boot".to_string());

    // 4. A handler that removes the logger while the emit is in flight
    let weak = Arc::downgrade(&chan);
    let remover = {
        let logger = Arc::clone(&logger);
        handler(move |_ev: &String| {
            if let Some(chan) = weak.upgrade() {
                let removed = chan.unsubscribe(&logger);
                println!("[remover] logger removed: {removed}");
            }
        })
    };
    chan.subscribe_once(remover);

    chan.emit(&"tick".to_string());
    chan.emit(&"tick".to_string());

    println!(
        "[meter] seen={} last={:?}",
        meter.seen.load(Ordering::Relaxed),
        meter.last.lock().unwrap()
    );

    // 5. Method and instance removal
    assert!(chan.unsubscribe_method(&meter, Meter::count));
    let dropped = chan.unsubscribe_instance(&meter);
    println!("[main] instance subscriptions dropped: {dropped}");
    println!("[main] subscribers left: {}", chan.len());
}
