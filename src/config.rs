//! Collector configuration.

use serde::{Deserialize, Serialize};

use crate::error::{OracleError, Result};

/// Relaxations the collector is allowed to explore.
///
/// The three `relax_*` flags only make sense on top of weak atomicity and are
/// cleared by [`CollectorOptions::normalized`] when it is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CollectorOptions {
    /// Let invocations observe a subset of their prefix.
    pub weak_atomicity: bool,
    /// Allow linearizations that violate happens-before.
    pub relax_lin_happens_before: bool,
    /// Allow visible sets that miss happens-before predecessors.
    pub relax_vis_happens_before: bool,
    /// Accept projections that disagree on return values.
    pub relax_returns: bool,
}

impl CollectorOptions {
    /// Atomic, happens-before respecting semantics only.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// Weak atomicity, still respecting happens-before and return agreement.
    #[must_use]
    pub fn weak() -> Self {
        Self {
            weak_atomicity: true,
            ..Self::default()
        }
    }

    /// Every relaxation enabled.
    #[must_use]
    pub fn relaxed() -> Self {
        Self {
            weak_atomicity: true,
            relax_lin_happens_before: true,
            relax_vis_happens_before: true,
            relax_returns: true,
        }
    }

    #[must_use]
    pub fn with_weak_atomicity(mut self, on: bool) -> Self {
        self.weak_atomicity = on;
        self
    }

    #[must_use]
    pub fn with_relax_lin_happens_before(mut self, on: bool) -> Self {
        self.relax_lin_happens_before = on;
        self
    }

    #[must_use]
    pub fn with_relax_vis_happens_before(mut self, on: bool) -> Self {
        self.relax_vis_happens_before = on;
        self
    }

    #[must_use]
    pub fn with_relax_returns(mut self, on: bool) -> Self {
        self.relax_returns = on;
        self
    }

    /// Clear the relaxations that require weak atomicity when it is off.
    #[must_use]
    pub fn normalized(self) -> Self {
        let weak = self.weak_atomicity;
        Self {
            weak_atomicity: weak,
            relax_lin_happens_before: weak && self.relax_lin_happens_before,
            relax_vis_happens_before: weak && self.relax_vis_happens_before,
            relax_returns: weak && self.relax_returns,
        }
    }

    /// Parse options from JSON, e.g. `{"weak-atomicity": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)
            .map(Self::normalized)
            .map_err(|e| OracleError::InvalidOptions(e.to_string()))
    }
}
