//! Total orders over a harness's invocations.

use std::fmt;

use ahash::{HashMap, HashMapExt};

use crate::invocation::InvocationId;
use crate::order::PartialOrder;

/// A sequence containing every invocation exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Linearization {
    sequence: Vec<InvocationId>,
    /// True iff the sequence places some invocation before one of its
    /// happens-before predecessors.
    weak: bool,
}

impl Linearization {
    /// Enumerate the linearizations of `order`. See [`Linearizations`].
    #[must_use]
    pub fn enumerate(order: &PartialOrder, relax: bool) -> Linearizations {
        Linearizations::new(order, relax)
    }

    #[must_use]
    pub fn sequence(&self) -> &[InvocationId] {
        &self.sequence
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn iter(&self) -> impl Iterator<Item = InvocationId> + '_ {
        self.sequence.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl fmt::Display for Linearization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self.sequence.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", items.join(", "))?;
        if self.weak {
            f.write_str(" (weak)")?;
        }
        Ok(())
    }
}

/// Lazy enumeration of linearizations.
///
/// Without relaxation this yields each linear extension of the order exactly
/// once. With relaxation it yields all `n!` permutations, tagging as weak those
/// that violate some happens-before edge. Re-enumerating is a matter of
/// cloning or rebuilding the iterator.
#[derive(Debug, Clone)]
pub struct Linearizations {
    invocations: Vec<InvocationId>,
    relax: bool,
    /// Predecessor indices of each index.
    predecessors: Vec<Vec<usize>>,
    placed: Vec<bool>,
    sequence: Vec<usize>,
    /// Next candidate index to try at each open depth; empty once exhausted.
    cursors: Vec<usize>,
}

impl Linearizations {
    #[must_use]
    pub fn new(order: &PartialOrder, relax: bool) -> Self {
        let invocations = order.invocations().to_vec();
        let mut index: HashMap<InvocationId, usize> = HashMap::with_capacity(invocations.len());
        for (i, &id) in invocations.iter().enumerate() {
            index.insert(id, i);
        }
        let predecessors = invocations
            .iter()
            .map(|&id| {
                order
                    .predecessors(id)
                    .into_iter()
                    .filter_map(|p| index.get(&p).copied())
                    .collect()
            })
            .collect();

        Self {
            placed: vec![false; invocations.len()],
            sequence: Vec::with_capacity(invocations.len()),
            cursors: vec![0],
            invocations,
            relax,
            predecessors,
        }
    }

    fn admissible(&self, candidate: usize) -> bool {
        self.relax || self.predecessors[candidate].iter().all(|&p| self.placed[p])
    }

    fn emit(&self) -> Linearization {
        // Weak iff some element precedes one of its own predecessors.
        let mut seen = vec![false; self.invocations.len()];
        let mut weak = false;
        for &i in &self.sequence {
            if self.predecessors[i].iter().any(|&p| !seen[p]) {
                weak = true;
            }
            seen[i] = true;
        }
        Linearization {
            sequence: self.sequence.iter().map(|&i| self.invocations[i]).collect(),
            weak,
        }
    }
}

impl Iterator for Linearizations {
    type Item = Linearization;

    fn next(&mut self) -> Option<Linearization> {
        let n = self.invocations.len();
        if n == 0 {
            // The empty order has exactly one (empty) linearization.
            return self.cursors.pop().map(|_| self.emit());
        }

        loop {
            let cursor = *self.cursors.last()?;
            let candidate = (cursor..n).find(|&c| !self.placed[c] && self.admissible(c));

            match candidate {
                Some(c) => {
                    if let Some(top) = self.cursors.last_mut() {
                        *top = c + 1;
                    }
                    self.placed[c] = true;
                    self.sequence.push(c);

                    if self.sequence.len() == n {
                        let linearization = self.emit();
                        self.placed[c] = false;
                        self.sequence.pop();
                        return Some(linearization);
                    }
                    self.cursors.push(0);
                }
                None => {
                    self.cursors.pop();
                    if let Some(c) = self.sequence.pop() {
                        self.placed[c] = false;
                    }
                }
            }
        }
    }
}
