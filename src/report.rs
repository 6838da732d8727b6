//! Acceptable-result tables derived from collected outcomes.
//!
//! An [`OutcomeTable`] is the oracle handed to a stress-test generator: every
//! observable result of the harness, with the relaxations that justify it.
//! Tables serialize to JSON, or to newline-delimited records for streaming.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::config::CollectorOptions;
use crate::error::Result;
use crate::invocation::InvocationId;
use crate::outcome::{Outcome, Properties};

/// One invocation's result within a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: InvocationId,
    pub invocation: String,
    pub result: String,
}

/// One acceptable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub results: Vec<ResultEntry>,
    pub properties: Properties,
    /// Human-readable form of `properties`, e.g. `atomic` or `W,V`.
    pub classification: String,
}

impl From<&Outcome> for OutcomeRecord {
    fn from(outcome: &Outcome) -> Self {
        Self {
            results: outcome
                .results()
                .iter()
                .map(|(call, result)| ResultEntry {
                    id: call.id,
                    invocation: call.label.clone(),
                    result: result.clone(),
                })
                .collect(),
            properties: outcome.properties(),
            classification: outcome.properties().to_string(),
        }
    }
}

impl OutcomeRecord {
    /// Does this record describe exactly `observed`?
    #[must_use]
    pub fn matches(&self, observed: &[(InvocationId, &str)]) -> bool {
        let ids: BTreeSet<InvocationId> = observed.iter().map(|&(id, _)| id).collect();
        ids.len() == observed.len()
            && self.results.len() == observed.len()
            && self.results.iter().all(|entry| {
                observed
                    .iter()
                    .any(|&(id, value)| entry.id == id && entry.result == value)
            })
    }
}

/// Every acceptable result of one harness under one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTable {
    pub harness: String,
    pub options: CollectorOptions,
    pub outcomes: Vec<OutcomeRecord>,
}

impl OutcomeTable {
    #[must_use]
    pub fn new(harness: impl Into<String>, options: CollectorOptions, outcomes: &[Outcome]) -> Self {
        Self {
            harness: harness.into(),
            options,
            outcomes: outcomes.iter().map(OutcomeRecord::from).collect(),
        }
    }

    /// Relaxation classes under which `observed` is acceptable. Empty when
    /// the observation is forbidden.
    #[must_use]
    pub fn classify(&self, observed: &[(InvocationId, &str)]) -> Vec<Properties> {
        self.outcomes
            .iter()
            .filter(|record| record.matches(observed))
            .map(|record| record.properties)
            .collect()
    }

    /// Is `observed` acceptable without any relaxation?
    #[must_use]
    pub fn is_atomic(&self, observed: &[(InvocationId, &str)]) -> bool {
        self.classify(observed).iter().any(Properties::is_atomic)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write one JSON record per line.
    pub fn write_records<W: Write>(&self, mut out: W) -> Result<()> {
        for record in &self.outcomes {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read newline-delimited records, skipping blank lines.
    pub fn read_records<R: BufRead>(input: R) -> Result<Vec<OutcomeRecord>> {
        let mut records = Vec::new();
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}
