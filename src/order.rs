//! Happens-before partial order over the invocations of a harness.

use std::collections::BTreeSet;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::error::{OracleError, Result};
use crate::invocation::InvocationId;

/// An irreflexive, transitively closed strict order.
///
/// Built from direct edges (program order, explicit synchronization); the
/// closure is computed once at construction so queries are set lookups.
#[derive(Debug, Clone, Default)]
pub struct PartialOrder {
    invocations: Vec<InvocationId>,
    /// Transitive predecessors of each invocation.
    predecessors: HashMap<InvocationId, HashSet<InvocationId>>,
}

impl PartialOrder {
    /// Build the order from its invocations and direct `(before, after)` edges.
    pub fn new(
        invocations: impl IntoIterator<Item = InvocationId>,
        edges: impl IntoIterator<Item = (InvocationId, InvocationId)>,
    ) -> Result<Self> {
        let mut known: HashSet<InvocationId> = HashSet::new();
        let mut ordered = Vec::new();
        for id in invocations {
            if !known.insert(id) {
                return Err(OracleError::DuplicateInvocation { id });
            }
            ordered.push(id);
        }

        let mut direct: HashMap<InvocationId, Vec<InvocationId>> = HashMap::new();
        for (before, after) in edges {
            for id in [before, after] {
                if !known.contains(&id) {
                    return Err(OracleError::UnknownInvocation { id });
                }
            }
            direct.entry(after).or_default().push(before);
        }

        let mut predecessors = HashMap::with_capacity(ordered.len());
        for &id in &ordered {
            let closure = ancestors(id, &direct);
            if closure.contains(&id) {
                return Err(OracleError::CyclicOrder { id });
            }
            predecessors.insert(id, closure);
        }

        Ok(Self {
            invocations: ordered,
            predecessors,
        })
    }

    /// An order with no edges: every pair of invocations is concurrent.
    pub fn unordered(invocations: impl IntoIterator<Item = InvocationId>) -> Result<Self> {
        Self::new(invocations, std::iter::empty())
    }

    /// Does `a` happen before `b`?
    #[must_use]
    pub fn happens_before(&self, a: InvocationId, b: InvocationId) -> bool {
        self.predecessors
            .get(&b)
            .is_some_and(|preds| preds.contains(&a))
    }

    /// Are `a` and `b` unordered?
    #[must_use]
    pub fn concurrent(&self, a: InvocationId, b: InvocationId) -> bool {
        a != b && !self.happens_before(a, b) && !self.happens_before(b, a)
    }

    /// All invocations that happen before `b`, in id order.
    #[must_use]
    pub fn predecessors(&self, b: InvocationId) -> BTreeSet<InvocationId> {
        self.predecessors
            .get(&b)
            .map(|preds| preds.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every invocation, in registration order.
    #[must_use]
    pub fn invocations(&self) -> &[InvocationId] {
        &self.invocations
    }

    #[must_use]
    pub fn contains(&self, id: InvocationId) -> bool {
        self.predecessors.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Transitive predecessors of `id`. Contains `id` itself only on a cycle.
fn ancestors(
    id: InvocationId,
    direct: &HashMap<InvocationId, Vec<InvocationId>>,
) -> HashSet<InvocationId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<InvocationId> = direct.get(&id).cloned().unwrap_or_default();
    while let Some(next) = stack.pop() {
        if seen.insert(next) {
            if let Some(preds) = direct.get(&next) {
                stack.extend(preds.iter().copied());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<InvocationId> {
        (0..n).map(InvocationId).collect()
    }

    fn e(a: usize, b: usize) -> (InvocationId, InvocationId) {
        (InvocationId(a), InvocationId(b))
    }

    #[test]
    fn test_transitive_closure() {
        let order = PartialOrder::new(ids(3), [e(0, 1), e(1, 2)]).unwrap();

        assert!(order.happens_before(InvocationId(0), InvocationId(1)));
        assert!(order.happens_before(InvocationId(0), InvocationId(2)));
        assert!(!order.happens_before(InvocationId(2), InvocationId(0)));
        assert_eq!(
            order.predecessors(InvocationId(2)),
            BTreeSet::from([InvocationId(0), InvocationId(1)])
        );
    }

    #[test]
    fn test_irreflexive() {
        let order = PartialOrder::new(ids(2), [e(0, 1)]).unwrap();
        for &id in order.invocations() {
            assert!(!order.happens_before(id, id));
        }
    }

    #[test]
    fn test_cycle_rejected() {
        let err = PartialOrder::new(ids(3), [e(0, 1), e(1, 2), e(2, 0)]).unwrap_err();
        assert!(matches!(err, OracleError::CyclicOrder { .. }));
    }

    #[test]
    fn test_self_edge_rejected() {
        let err = PartialOrder::new(ids(1), [e(0, 0)]).unwrap_err();
        assert_eq!(err, OracleError::CyclicOrder { id: InvocationId(0) });
    }

    #[test]
    fn test_unknown_invocation_rejected() {
        let err = PartialOrder::new(ids(2), [e(0, 5)]).unwrap_err();
        assert_eq!(err, OracleError::UnknownInvocation { id: InvocationId(5) });
    }

    #[test]
    fn test_duplicate_invocation_rejected() {
        let err = PartialOrder::unordered([InvocationId(1), InvocationId(1)]).unwrap_err();
        assert_eq!(err, OracleError::DuplicateInvocation { id: InvocationId(1) });
    }

    #[test]
    fn test_unordered_is_all_concurrent() {
        let order = PartialOrder::unordered(ids(3)).unwrap();
        assert_eq!(order.len(), 3);
        assert!(order.concurrent(InvocationId(0), InvocationId(2)));
        assert!(order.predecessors(InvocationId(1)).is_empty());
    }
}
