//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Once;

use outcome_oracle::{Constructor, Harness, Method};
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Route `tracing` output through the test writer. Filter with `RUST_LOG`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

pub type Queue = VecDeque<i32>;

pub fn queue() -> Constructor<Queue> {
    Constructor::new("new Queue()", Queue::new)
}

pub fn add(v: i32) -> Method<Queue> {
    Method::new(format!("add({v})"), move |q: &mut Queue| q.push_back(v))
}

pub fn peek() -> Method<Queue> {
    Method::new("peek()", |q: &mut Queue| q.front().copied())
}

pub fn poll() -> Method<Queue> {
    Method::new("poll()", |q: &mut Queue| q.pop_front())
}

pub fn clear() -> Method<Queue> {
    Method::new("clear()", |q: &mut Queue| q.clear())
}

/// `add(1) -> add(2)`, both before `peek()`.
pub fn add_add_peek() -> Harness<Queue> {
    let mut b = Harness::builder("add-add-peek", queue());
    let a1 = b.invoke(add(1));
    let a2 = b.invoke(add(2));
    let p = b.invoke(peek());
    b.thread([a1, a2, p]);
    b.build().expect("valid harness")
}
