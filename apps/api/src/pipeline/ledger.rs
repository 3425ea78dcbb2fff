//! Pair Ledger: which (job, candidate) pairs of a run have been scored.
//!
//! A pair is recorded only after the scoring oracle returned successfully, never
//! before the call. The ledger grows monotonically and is cleared once when the
//! run moves past the ranking stage. It is serializable so a run snapshot can be
//! restored and resumed without re-scoring recorded pairs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::evaluation::Candidate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairLedger {
    pairs: BTreeMap<String, BTreeSet<String>>,
}

impl PairLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the ranking stage has started on `job_name`.
    pub fn has(&self, job_name: &str) -> bool {
        self.pairs.contains_key(job_name)
    }

    /// Registers a job the ranking stage is about to work on.
    pub fn open(&mut self, job_name: &str) {
        self.pairs.entry(job_name.to_string()).or_default();
    }

    pub fn record(&mut self, job_name: &str, candidate_name: &str) {
        self.pairs
            .entry(job_name.to_string())
            .or_default()
            .insert(candidate_name.to_string());
    }

    pub fn is_recorded(&self, job_name: &str, candidate_name: &str) -> bool {
        self.pairs
            .get(job_name)
            .is_some_and(|candidates| candidates.contains(candidate_name))
    }

    /// A job is complete when every candidate of the run is recorded against it.
    pub fn is_job_complete(&self, job_name: &str, candidates: &[Candidate]) -> bool {
        self.has(job_name)
            && candidates
                .iter()
                .all(|c| self.is_recorded(job_name, &c.name))
    }

    pub fn recorded_pairs(&self) -> usize {
        self.pairs.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}
