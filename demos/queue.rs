//! Outcome oracle for a queue harness.
//!
//! Run with: cargo run --example queue
//! Set RUST_LOG=outcome_oracle=trace to watch the search.

use std::collections::VecDeque;

use outcome_oracle::{
    CollectorOptions, Constructor, Harness, Method, OutcomeCollector, OutcomeTable,
};
use tracing_subscriber::EnvFilter;

type Queue = VecDeque<i32>;

fn add(v: i32) -> Method<Queue> {
    Method::new(format!("add({v})"), move |q: &mut Queue| q.push_back(v))
}

fn main() -> outcome_oracle::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Four calls, each on its own thread, against one shared queue.
    let harness = Harness::all_against_one(
        "ConcurrentQueueTest",
        Constructor::new("new Queue()", Queue::new),
        [
            add(1),
            add(2),
            Method::new("clear()", |q: &mut Queue| q.clear()),
            Method::new("peek()", |q: &mut Queue| q.front().copied()),
        ],
    )?;
    println!("Harness: {harness}");

    // Atomic semantics: what a linearizable queue may return.
    let strict = OutcomeCollector::strict().collect(&harness)?;
    println!("\n--- {} atomic outcomes ---\n", strict.len());
    for outcome in &strict {
        println!("{outcome}");
    }

    // Weak atomicity: what a queue with non-atomic operations may return.
    let options = CollectorOptions::weak().with_relax_returns(true);
    let weak = OutcomeCollector::new(options).collect(&harness)?;
    println!("\n--- {} outcomes under {options:?} ---\n", weak.len());
    for outcome in &weak {
        println!("{outcome}");
    }

    // The acceptable-result table a stress test would check against.
    let table = OutcomeTable::new(harness.name(), options, &weak);
    println!("\n{}", table.to_json_pretty()?);

    println!("\nDone!");
    Ok(())
}
