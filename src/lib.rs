//! Test oracles for concurrent objects.
//!
//! Given a harness (a constructor plus a few method calls ordered by
//! happens-before), this crate enumerates every way the calls could interleave
//! and observe each other, runs each candidate against a real implementation,
//! and reports the distinct observable outcomes together with the consistency
//! relaxations each one needs.
//!
//! # Quick Start
//!
//! ```
//! use std::collections::VecDeque;
//! use outcome_oracle::{Constructor, Harness, Method, OutcomeCollector};
//!
//! type Queue = VecDeque<i32>;
//!
//! let mut builder = Harness::builder("add-add-peek", Constructor::new("Queue::new()", Queue::new));
//! let a1 = builder.invoke(Method::new("add(1)", |q: &mut Queue| q.push_back(1)));
//! let a2 = builder.invoke(Method::new("add(2)", |q: &mut Queue| q.push_back(2)));
//! let peek = builder.invoke(Method::new("peek()", |q: &mut Queue| q.front().copied()));
//! builder.thread([a1, a2]);
//! builder.order(a2, peek);
//! let harness = builder.build().unwrap();
//!
//! let outcomes = OutcomeCollector::strict().collect(&harness).unwrap();
//! assert_eq!(outcomes.len(), 1);
//! assert_eq!(outcomes[0].get(peek), Some("1"));
//! assert!(outcomes[0].properties().is_atomic());
//! ```
//!
//! # Relaxations
//!
//! Each [`Outcome`] carries [`Properties`], four flags naming what had to be
//! given up to explain it:
//!
//! - **W** (weak atomicity): some call did not observe everything before it
//! - **L** (weak linearization): the total order contradicts happens-before
//! - **V** (weak visibility): some call missed one of its causal predecessors
//! - **R** (relaxed returns): projections disagreed on a return value
//!
//! Which of these the search may use is set by [`CollectorOptions`]. Of the
//! outcomes sharing the same results, only the least relaxed are reported.

pub mod collector;
pub mod config;
pub mod error;
pub mod harness;
pub mod invocation;
pub mod linearization;
pub mod order;
pub mod outcome;
pub mod report;
pub mod visibility;

pub use collector::{execute, OutcomeCollector};
pub use config::CollectorOptions;
pub use error::{InvocationFailure, OracleError, Result};
pub use harness::{Harness, HarnessBuilder, ThreadId};
pub use invocation::{Call, Canonical, Constructor, Invocation, InvocationId, Method};
pub use linearization::{Linearization, Linearizations};
pub use order::PartialOrder;
pub use outcome::{minimal, Outcome, Properties, ResultMap};
pub use report::{OutcomeRecord, OutcomeTable, ResultEntry};
pub use visibility::{Visibilities, Visibility};
