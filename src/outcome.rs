//! Outcomes and their relaxation classification.
//!
//! An [`Outcome`] maps each invocation to the result it returned, together with
//! the [`Properties`] that were needed to explain it:
//!
//! - **W**: some invocation did not observe its entire prefix
//! - **L**: the linearization violates happens-before
//! - **V**: some visible set misses a happens-before predecessor
//! - **R**: projections disagreed on a return value and were accepted anyway
//!
//! Of several outcomes with the same results, only those whose relaxations are
//! not a strict superset of another's are kept by [`minimal`].

use std::collections::BTreeMap;
use std::fmt;

use ahash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};

use crate::invocation::{Call, InvocationId};

/// Results of a set of invocations, ordered by invocation id.
pub type ResultMap = BTreeMap<Call, String>;

/// Relaxations needed to justify an outcome.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Properties {
    #[serde(rename = "W")]
    pub weak_atomicity: bool,
    #[serde(rename = "L")]
    pub weak_linearization: bool,
    #[serde(rename = "V")]
    pub weak_visibility: bool,
    #[serde(rename = "R")]
    pub relaxed_returns: bool,
}

impl Properties {
    /// No relaxation at all.
    #[must_use]
    pub fn atomic() -> Self {
        Self::default()
    }

    /// Flags in `W`, `L`, `V`, `R` order.
    #[must_use]
    pub fn flags(&self) -> [(char, bool); 4] {
        [
            ('W', self.weak_atomicity),
            ('L', self.weak_linearization),
            ('V', self.weak_visibility),
            ('R', self.relaxed_returns),
        ]
    }

    #[must_use]
    pub fn is_atomic(&self) -> bool {
        self.flags().iter().all(|(_, set)| !set)
    }

    /// `self` is strictly stricter than `other`: the two differ, and every
    /// relaxation `self` needs is also needed by `other`.
    #[must_use]
    pub fn dominates(&self, other: &Properties) -> bool {
        self != other
            && self
                .flags()
                .iter()
                .zip(other.flags())
                .all(|(&(_, mine), (_, theirs))| !mine || theirs)
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atomic() {
            return f.write_str("atomic");
        }
        let set: Vec<String> = self
            .flags()
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name.to_string())
            .collect();
        f.write_str(&set.join(","))
    }
}

/// Observed results of one candidate execution, with its classification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Outcome {
    results: ResultMap,
    properties: Properties,
}

impl Outcome {
    #[must_use]
    pub fn new(properties: Properties) -> Self {
        Self {
            results: ResultMap::new(),
            properties,
        }
    }

    #[must_use]
    pub fn from_results(results: ResultMap, properties: Properties) -> Self {
        Self {
            results,
            properties,
        }
    }

    #[must_use]
    pub fn results(&self) -> &ResultMap {
        &self.results
    }

    #[must_use]
    pub fn properties(&self) -> Properties {
        self.properties
    }

    /// Result recorded for `id`, if any.
    #[must_use]
    pub fn get(&self, id: InvocationId) -> Option<&str> {
        self.results.get(&id).map(String::as_str)
    }

    /// Result recorded for the invocation labelled `label`.
    ///
    /// Labels need not be unique; the lowest id wins.
    #[must_use]
    pub fn get_by_label(&self, label: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|(call, _)| call.label == label)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn with_weak_atomicity(mut self) -> Self {
        self.properties.weak_atomicity = true;
        self
    }

    /// Fold the projected execution of `key` into this outcome.
    ///
    /// `key` takes its result from `projected`. Every other invocation of
    /// `projected` that is already recorded must agree with the recorded
    /// value; a disagreement discards the outcome (`None`) unless
    /// `relax_returns`, in which case the first-seen value is kept and `R` is
    /// set.
    #[must_use]
    pub fn merge(mut self, projected: &ResultMap, key: &Call, relax_returns: bool) -> Option<Self> {
        for (call, value) in projected {
            if call == key {
                continue;
            }
            match self.results.get(call) {
                Some(recorded) if recorded != value => {
                    if !relax_returns {
                        return None;
                    }
                    self.properties.relaxed_returns = true;
                }
                Some(_) => {}
                None => {
                    self.results.insert(call.clone(), value.clone());
                }
            }
        }
        if let Some(value) = projected.get(key) {
            self.results.insert(key.clone(), value.clone());
        }
        Some(self)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .results
            .iter()
            .map(|(call, value)| format!("{call}={value}"))
            .collect();
        write!(f, "{{{}}} {}", entries.join(", "), self.properties)
    }
}

/// Drop every outcome whose properties are dominated by another outcome with
/// the same results. The survivors are returned sorted.
#[must_use]
pub fn minimal(outcomes: impl IntoIterator<Item = Outcome>) -> Vec<Outcome> {
    let mut groups: HashMap<ResultMap, Vec<Properties>> = HashMap::new();
    for outcome in outcomes {
        let props = groups.entry(outcome.results).or_default();
        if !props.contains(&outcome.properties) {
            props.push(outcome.properties);
        }
    }

    let mut survivors: Vec<Outcome> = groups
        .into_iter()
        .flat_map(|(results, props)| {
            props
                .iter()
                .filter(|&p| !props.iter().any(|q| q.dominates(p)))
                .map(|&p| Outcome::from_results(results.clone(), p))
                .collect::<Vec<_>>()
        })
        .collect();
    survivors.sort();
    survivors
}
