//! Which earlier invocations each invocation observes.
//!
//! Under atomic semantics every invocation observes its whole prefix in the
//! linearization. Weak atomicity lets an invocation observe any subset of its
//! prefix, optionally still required to contain its causal predecessors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::invocation::InvocationId;
use crate::linearization::Linearization;
use crate::order::PartialOrder;

/// Visible sets for every invocation of one linearization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    visible: BTreeMap<InvocationId, BTreeSet<InvocationId>>,
    /// Some visible set is a strict subset of its prefix.
    weak: bool,
    /// Some visible set misses a happens-before predecessor.
    violates_order: bool,
}

impl Visibility {
    /// Enumerate visibilities of `linearization`. See [`Visibilities`].
    #[must_use]
    pub fn enumerate(
        order: &PartialOrder,
        linearization: &Linearization,
        weak_atomicity: bool,
        relax: bool,
    ) -> Visibilities {
        Visibilities::new(order, linearization, weak_atomicity, relax)
    }

    /// Every invocation observes its whole prefix.
    #[must_use]
    pub fn full(linearization: &Linearization) -> Self {
        let mut visible = BTreeMap::new();
        let mut prefix = BTreeSet::new();
        for id in linearization.iter() {
            visible.insert(id, prefix.clone());
            prefix.insert(id);
        }
        Self {
            visible,
            weak: false,
            violates_order: false,
        }
    }

    /// Invocations whose effects `id` observes.
    #[must_use]
    pub fn visible_set(&self, id: InvocationId) -> Option<&BTreeSet<InvocationId>> {
        self.visible.get(&id)
    }

    /// Does `observer` observe `effect`?
    #[must_use]
    pub fn sees(&self, observer: InvocationId, effect: InvocationId) -> bool {
        self.visible
            .get(&observer)
            .is_some_and(|set| set.contains(&effect))
    }

    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    #[must_use]
    pub fn violates_happens_before(&self) -> bool {
        self.violates_order
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .visible
            .iter()
            .map(|(id, set)| {
                let seen: Vec<String> = set.iter().map(ToString::to_string).collect();
                format!("{id}:{{{}}}", seen.join(","))
            })
            .collect();
        write!(f, "{}", entries.join(" "))?;
        if self.weak {
            f.write_str(" (weak)")?;
        }
        Ok(())
    }
}

/// One admissible visible set for one invocation.
#[derive(Debug, Clone)]
struct Choice {
    set: BTreeSet<InvocationId>,
    partial: bool,
    violates_order: bool,
}

/// Lazy enumeration of visibilities over one linearization.
///
/// The admissible sets of each invocation are computed up front; their cross
/// product is walked one assignment at a time.
#[derive(Debug, Clone)]
pub struct Visibilities {
    sequence: Vec<InvocationId>,
    choices: Vec<Vec<Choice>>,
    odometer: Vec<usize>,
    exhausted: bool,
}

impl Visibilities {
    #[must_use]
    pub fn new(
        order: &PartialOrder,
        linearization: &Linearization,
        weak_atomicity: bool,
        relax: bool,
    ) -> Self {
        let sequence = linearization.sequence().to_vec();
        let choices: Vec<Vec<Choice>> = sequence
            .iter()
            .enumerate()
            .map(|(pos, &id)| {
                let prefix = &sequence[..pos];
                if !weak_atomicity {
                    return vec![Choice {
                        set: prefix.iter().copied().collect(),
                        partial: false,
                        violates_order: false,
                    }];
                }
                let required: BTreeSet<InvocationId> = prefix
                    .iter()
                    .copied()
                    .filter(|&p| order.happens_before(p, id))
                    .collect();
                subsets(prefix)
                    .into_iter()
                    .filter_map(|set| {
                        let violates_order = !required.is_subset(&set);
                        if violates_order && !relax {
                            return None;
                        }
                        Some(Choice {
                            partial: set.len() < prefix.len(),
                            set,
                            violates_order,
                        })
                    })
                    .collect()
            })
            .collect();

        Self {
            odometer: vec![0; sequence.len()],
            sequence,
            choices,
            exhausted: false,
        }
    }

    fn current(&self) -> Visibility {
        let mut visible = BTreeMap::new();
        let mut weak = false;
        let mut violates_order = false;
        for (pos, &id) in self.sequence.iter().enumerate() {
            let choice = &self.choices[pos][self.odometer[pos]];
            weak |= choice.partial;
            violates_order |= choice.violates_order;
            visible.insert(id, choice.set.clone());
        }
        Visibility {
            visible,
            weak,
            violates_order,
        }
    }

    /// Advance the odometer; the last position turns fastest.
    fn advance(&mut self) {
        for pos in (0..self.odometer.len()).rev() {
            self.odometer[pos] += 1;
            if self.odometer[pos] < self.choices[pos].len() {
                return;
            }
            self.odometer[pos] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for Visibilities {
    type Item = Visibility;

    fn next(&mut self) -> Option<Visibility> {
        if self.exhausted {
            return None;
        }
        let visibility = self.current();
        self.advance();
        Some(visibility)
    }
}

/// Every subset of `items`, the full set first.
fn subsets(items: &[InvocationId]) -> Vec<BTreeSet<InvocationId>> {
    let mut all = vec![BTreeSet::new()];
    for &item in items.iter().rev() {
        let with: Vec<BTreeSet<InvocationId>> = all
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.insert(item);
                s
            })
            .collect();
        all = with.into_iter().chain(all).collect();
    }
    all
}
