//! Property tests for enumeration counts, domination and minimality.

mod common;

use common::init_test_logging;
use outcome_oracle::{
    minimal, Call, InvocationId, Linearization, Outcome, PartialOrder, Properties, ResultMap,
    Visibility,
};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_properties() -> impl Strategy<Value = Properties> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(w, l, v, r)| {
        Properties {
            weak_atomicity: w,
            weak_linearization: l,
            weak_visibility: v,
            relaxed_returns: r,
        }
    })
}

/// A DAG over `n` invocations: edges only go from lower to higher ids.
fn arb_order() -> impl Strategy<Value = PartialOrder> {
    (1usize..=5).prop_flat_map(|n| {
        proptest::collection::vec(any::<bool>(), n * (n - 1) / 2).prop_map(move |bits| {
            let mut edges = Vec::new();
            let mut k = 0;
            for a in 0..n {
                for b in (a + 1)..n {
                    if bits[k] {
                        edges.push((InvocationId(a), InvocationId(b)));
                    }
                    k += 1;
                }
            }
            PartialOrder::new((0..n).map(InvocationId), edges).expect("acyclic by construction")
        })
    })
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    (prop_oneof![Just("null"), Just("1"), Just("2")], arb_properties()).prop_map(
        |(value, props)| {
            let mut results = ResultMap::new();
            results.insert(
                Call {
                    id: InvocationId(0),
                    label: "peek()".into(),
                },
                value.to_string(),
            );
            Outcome::from_results(results, props)
        },
    )
}

fn factorial(n: usize) -> usize {
    (1..=n).product()
}

/// Brute-force count of permutations respecting `order`.
fn count_linear_extensions(order: &PartialOrder) -> usize {
    fn go(order: &PartialOrder, placed: &mut Vec<InvocationId>) -> usize {
        if placed.len() == order.len() {
            return 1;
        }
        let mut total = 0;
        for &id in order.invocations() {
            if placed.contains(&id) {
                continue;
            }
            if order.predecessors(id).iter().all(|p| placed.contains(p)) {
                placed.push(id);
                total += go(order, placed);
                placed.pop();
            }
        }
        total
    }
    go(order, &mut Vec::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn linearization_counts(order in arb_order()) {
        init_test_logging();
        let extensions = count_linear_extensions(&order);

        let strict: Vec<_> = Linearization::enumerate(&order, false).collect();
        prop_assert_eq!(strict.len(), extensions);
        prop_assert!(strict.iter().all(|l| !l.is_weak()));

        let relaxed: Vec<_> = Linearization::enumerate(&order, true).collect();
        prop_assert_eq!(relaxed.len(), factorial(order.len()));
        prop_assert_eq!(relaxed.iter().filter(|l| !l.is_weak()).count(), extensions);
    }

    #[test]
    fn default_visibility_is_full_prefix(order in arb_order()) {
        init_test_logging();
        for lin in Linearization::enumerate(&order, false) {
            let all: Vec<_> = Visibility::enumerate(&order, &lin, false, false).collect();
            prop_assert_eq!(all.len(), 1);
            prop_assert!(!all[0].is_weak());
            prop_assert_eq!(&all[0], &Visibility::full(&lin));
        }
    }

    #[test]
    fn weak_visibility_keeps_predecessors(order in arb_order()) {
        init_test_logging();
        let lin = Linearization::enumerate(&order, false).next().expect("nonempty order");
        for vis in Visibility::enumerate(&order, &lin, true, false) {
            prop_assert!(!vis.violates_happens_before());
            for id in lin.iter() {
                for p in order.predecessors(id) {
                    prop_assert!(vis.sees(id, p));
                }
            }
        }
    }

    #[test]
    fn domination_is_irreflexive(p in arb_properties()) {
        prop_assert!(!p.dominates(&p));
    }

    #[test]
    fn domination_is_antisymmetric(p in arb_properties(), q in arb_properties()) {
        prop_assert!(!(p.dominates(&q) && q.dominates(&p)));
    }

    #[test]
    fn domination_is_transitive(
        p in arb_properties(),
        q in arb_properties(),
        r in arb_properties(),
    ) {
        if p.dominates(&q) && q.dominates(&r) {
            prop_assert!(p.dominates(&r));
        }
    }

    #[test]
    fn minimality_is_idempotent(outcomes in proptest::collection::vec(arb_outcome(), 0..16)) {
        init_test_logging();
        let once = minimal(outcomes.clone());
        let twice = minimal(once.clone());
        prop_assert_eq!(&once, &twice);

        // Every input result survives with some explanation.
        for o in &outcomes {
            prop_assert!(once.iter().any(|m| m.results() == o.results()));
        }
    }
}
