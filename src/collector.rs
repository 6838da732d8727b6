//! Outcome collector.
//!
//! For a harness, enumerate every linearization of its happens-before order
//! and every visibility over each linearization, execute the resulting
//! interleaving against fresh instances of the object under test, and keep
//! the outcomes that need the fewest relaxations.
//!
//! Executing one interleaving walks the linearization with a live object. For
//! each invocation `i`, the projection of its prefix onto what `i` observes is
//! replayed from scratch, followed by `i` itself; that replay decides `i`'s
//! result. When `i` observes its whole prefix the live object already is that
//! replay. Every earlier invocation in the replay must return what it returned
//! when it was itself executed, otherwise the interleaving is inconsistent and
//! contributes nothing (or, with relaxed returns, is tagged `R`).
//!
//! The search is exhaustive. Keep harnesses to a handful of invocations.

use ahash::{HashSet, HashSetExt};
use tracing::{debug, trace};

use crate::config::CollectorOptions;
use crate::error::{InvocationFailure, OracleError, Result};
use crate::harness::Harness;
use crate::invocation::{Constructor, Invocation, InvocationId};
use crate::linearization::Linearization;
use crate::outcome::{minimal, Outcome, Properties, ResultMap};
use crate::visibility::Visibility;

/// The outcome collector.
#[derive(Debug, Clone, Default)]
pub struct OutcomeCollector {
    options: CollectorOptions,
}

impl OutcomeCollector {
    pub fn new(options: CollectorOptions) -> Self {
        Self {
            options: options.normalized(),
        }
    }

    /// Atomic semantics only.
    pub fn strict() -> Self {
        Self::new(CollectorOptions::strict())
    }

    /// Weak atomicity without any happens-before or return relaxation.
    pub fn weak() -> Self {
        Self::new(CollectorOptions::weak())
    }

    pub fn options(&self) -> CollectorOptions {
        self.options
    }

    /// Minimal outcomes of `harness`, sorted.
    pub fn collect<T>(&self, harness: &Harness<T>) -> Result<Vec<Outcome>> {
        debug!(
            name = harness.name(),
            weak_atomicity = self.options.weak_atomicity,
            relax_lin_happens_before = self.options.relax_lin_happens_before,
            relax_vis_happens_before = self.options.relax_vis_happens_before,
            relax_returns = self.options.relax_returns,
            "computing outcomes for {harness}"
        );

        let outcomes = self.explore(harness)?;
        debug!(count = outcomes.len(), "computed outcomes");
        for outcome in &outcomes {
            trace!(%outcome, "outcome");
        }

        let minimals = minimal(outcomes);
        debug!(count = minimals.len(), "computed minimal outcomes");
        for outcome in &minimals {
            debug!(%outcome, "minimal outcome");
        }
        Ok(minimals)
    }

    /// Every distinct outcome of `harness`, before minimization, sorted.
    pub fn collect_all<T>(&self, harness: &Harness<T>) -> Result<Vec<Outcome>> {
        let mut outcomes: Vec<Outcome> = self.explore(harness)?.into_iter().collect();
        outcomes.sort();
        Ok(outcomes)
    }

    fn explore<T>(&self, harness: &Harness<T>) -> Result<HashSet<Outcome>> {
        let order = harness.happens_before();
        let mut outcomes = HashSet::new();

        for linearization in Linearization::enumerate(order, self.options.relax_lin_happens_before)
        {
            trace!(%linearization, "linearization");
            let sequence = resolve(harness, linearization.sequence())?;

            for visibility in Visibility::enumerate(
                order,
                &linearization,
                self.options.weak_atomicity,
                self.options.relax_vis_happens_before,
            ) {
                trace!(%visibility, "visibility");
                let properties = Properties {
                    weak_atomicity: false,
                    weak_linearization: linearization.is_weak(),
                    weak_visibility: visibility.violates_happens_before(),
                    relaxed_returns: false,
                };
                let executed = self.execute_interleaving(
                    harness.constructor(),
                    &sequence,
                    &visibility,
                    properties,
                )?;
                match executed {
                    Some(outcome) => {
                        trace!(%outcome, "outcome");
                        outcomes.insert(outcome);
                    }
                    None => trace!("incompatible projections"),
                }
            }
        }
        Ok(outcomes)
    }

    /// Execute one interleaving. `None` when its projections disagree.
    fn execute_interleaving<T>(
        &self,
        constructor: &Constructor<T>,
        sequence: &[&Invocation<T>],
        visibility: &Visibility,
        properties: Properties,
    ) -> Result<Option<Outcome>> {
        let mut live = constructor.construct()?;
        let mut live_results = ResultMap::new();
        let mut outcome = Outcome::new(properties);

        for (step, &invocation) in sequence.iter().enumerate() {
            let prefix = &sequence[..step];
            let projection: Vec<&Invocation<T>> = prefix
                .iter()
                .copied()
                .filter(|j| visibility.sees(invocation.id(), j.id()))
                .collect();

            let value = invocation
                .invoke(&mut live)
                .map_err(|source| at_step(step, sequence, source))?;
            live_results.insert(invocation.call(), value);

            let projected = if projection.len() == prefix.len() {
                live_results.clone()
            } else {
                outcome = outcome.with_weak_atomicity();
                let mut replay = projection;
                replay.push(invocation);
                trace!(projection = %labels(&replay), "replaying projection");
                execute(constructor, &replay)?
            };

            outcome = match outcome.merge(&projected, &invocation.call(), self.options.relax_returns)
            {
                Some(merged) => merged,
                None => return Ok(None),
            };
            trace!(cumulative = %outcome, "merged {invocation}");
        }

        Ok(Some(outcome))
    }
}

/// Run `sequence` in order against a fresh object and record every result.
pub fn execute<T>(constructor: &Constructor<T>, sequence: &[&Invocation<T>]) -> Result<ResultMap> {
    let mut target = constructor.construct()?;
    let mut results = ResultMap::new();
    for (step, invocation) in sequence.iter().enumerate() {
        let value = invocation
            .invoke(&mut target)
            .map_err(|source| at_step(step, sequence, source))?;
        results.insert(invocation.call(), value);
    }
    Ok(results)
}

fn resolve<'h, T>(harness: &'h Harness<T>, ids: &[InvocationId]) -> Result<Vec<&'h Invocation<T>>> {
    ids.iter()
        .map(|&id| {
            harness
                .invocation(id)
                .ok_or(OracleError::UnknownInvocation { id })
        })
        .collect()
}

fn at_step<T>(
    step: usize,
    sequence: &[&Invocation<T>],
    source: InvocationFailure,
) -> OracleError {
    OracleError::Invocation {
        step,
        sequence: labels(sequence),
        source,
    }
}

fn labels<T>(sequence: &[&Invocation<T>]) -> String {
    sequence
        .iter()
        .map(|inv| inv.label())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HarnessBuilder;
    use crate::invocation::Method;
    use std::collections::VecDeque;

    type Queue = VecDeque<i32>;

    fn ctor() -> Constructor<Queue> {
        Constructor::new("Queue::new()", Queue::new)
    }

    fn add(v: i32) -> Method<Queue> {
        Method::new(format!("add({v})"), move |q: &mut Queue| q.push_back(v))
    }

    fn peek() -> Method<Queue> {
        Method::new("peek()", |q: &mut Queue| q.front().copied())
    }

    fn poll() -> Method<Queue> {
        Method::new("poll()", |q: &mut Queue| q.pop_front())
    }

    /// add(1) -> add(2) -> peek(), all ordered.
    fn chained() -> Harness<Queue> {
        let mut b = HarnessBuilder::new("chained", ctor());
        let a1 = b.invoke(add(1));
        let a2 = b.invoke(add(2));
        let p = b.invoke(peek());
        b.order(a1, a2).order(a1, p).order(a2, p);
        b.build().unwrap()
    }

    fn peeks(outcomes: &[Outcome]) -> Vec<(String, String)> {
        outcomes
            .iter()
            .map(|o| {
                (
                    o.get_by_label("peek()").unwrap_or("-").to_string(),
                    o.properties().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_strict_chain_single_outcome() {
        let outcomes = OutcomeCollector::strict().collect(&chained()).unwrap();

        assert_eq!(outcomes.len(), 1);
        let o = &outcomes[0];
        assert_eq!(o.get_by_label("add(1)"), Some("null"));
        assert_eq!(o.get_by_label("add(2)"), Some("null"));
        assert_eq!(o.get_by_label("peek()"), Some("1"));
        assert!(o.properties().is_atomic());
    }

    #[test]
    fn test_weak_chain_respecting_order_is_still_atomic() {
        let outcomes = OutcomeCollector::weak().collect(&chained()).unwrap();
        assert_eq!(peeks(&outcomes), vec![("1".into(), "atomic".into())]);
    }

    #[test]
    fn test_relaxed_visibility_exposes_stale_peeks() {
        let collector =
            OutcomeCollector::new(CollectorOptions::weak().with_relax_vis_happens_before(true));
        let mut found = peeks(&collector.collect(&chained()).unwrap());
        found.sort();

        assert_eq!(
            found,
            vec![
                ("1".into(), "atomic".into()),
                ("2".into(), "W,V".into()),
                ("null".into(), "W,V".into()),
            ]
        );
    }

    #[test]
    fn test_relaxed_linearization_reorders() {
        let collector =
            OutcomeCollector::new(CollectorOptions::weak().with_relax_lin_happens_before(true));
        let mut found = peeks(&collector.collect(&chained()).unwrap());
        found.sort();

        assert_eq!(
            found,
            vec![
                ("1".into(), "atomic".into()),
                ("2".into(), "L".into()),
                ("null".into(), "L".into()),
            ]
        );
    }

    #[test]
    fn test_weak_atomicity_lets_two_polls_take_one_element() {
        let h = Harness::all_against_one("polls", ctor(), [add(1), poll(), poll()]).unwrap();
        let double = |o: &Outcome| {
            o.get(InvocationId(1)) == Some("1") && o.get(InvocationId(2)) == Some("1")
        };

        let strict = OutcomeCollector::strict().collect(&h).unwrap();
        assert!(!strict.iter().any(double));

        let weak = OutcomeCollector::weak().collect(&h).unwrap();
        let doubles: Vec<_> = weak.iter().filter(|&o| double(o)).collect();
        assert_eq!(doubles.len(), 1);
        assert_eq!(doubles[0].properties().to_string(), "W");
    }

    #[test]
    fn test_strict_mode_never_relaxes() {
        let h = Harness::all_against_one("mixed", ctor(), [add(1), poll(), peek()]).unwrap();
        for o in OutcomeCollector::strict().collect_all(&h).unwrap() {
            assert!(o.properties().is_atomic(), "{o}");
        }
    }

    #[test]
    fn test_without_relaxed_returns_no_outcome_has_r() {
        let h = Harness::all_against_one("polls", ctor(), [add(1), poll(), poll()]).unwrap();
        let all = OutcomeCollector::weak().collect_all(&h).unwrap();
        assert!(all.iter().all(|o| !o.properties().relaxed_returns));
    }

    #[test]
    fn test_relaxed_returns_tags_disagreement() {
        let h = Harness::all_against_one("polls", ctor(), [add(1), poll(), poll()]).unwrap();
        let collector = OutcomeCollector::new(CollectorOptions::weak().with_relax_returns(true));
        let all = collector.collect_all(&h).unwrap();
        assert!(all.iter().any(|o| o.properties().relaxed_returns));
    }

    #[test]
    fn test_base_execute_runs_in_order() {
        let h = chained();
        let seq: Vec<_> = h.invocations().iter().collect();
        let results = execute(h.constructor(), &seq).unwrap();

        let values: Vec<_> = results.values().cloned().collect();
        assert_eq!(values, vec!["null", "null", "1"]);
    }

    #[test]
    fn test_failing_invocation_is_fatal() {
        let failing: Method<Queue> = Method::fallible("explode()", |_q: &mut Queue| {
            Err::<(), _>("boom")
        });
        let h = Harness::all_against_one("bad", ctor(), [add(1), failing]).unwrap();

        match OutcomeCollector::strict().collect(&h) {
            Err(OracleError::Invocation { source, .. }) => {
                assert_eq!(source.invocation, "explode()");
                assert_eq!(source.reason, "boom");
            }
            other => panic!("expected invocation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_failing_constructor_is_fatal() {
        let ctor: Constructor<Queue> =
            Constructor::fallible("Queue::broken()", || Err::<Queue, _>("unavailable"));
        let h = Harness::all_against_one("bad", ctor, [add(1)]).unwrap();
        assert!(matches!(
            OutcomeCollector::weak().collect(&h),
            Err(OracleError::Construction { .. })
        ));
    }

    #[test]
    fn test_empty_harness_has_one_empty_outcome() {
        let h = Harness::all_against_one("empty", ctor(), Vec::new()).unwrap();
        let outcomes = OutcomeCollector::strict().collect(&h).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_empty());
    }
}
