//! Progression Gate: decides whether the ranking stage must run again.

use std::collections::BTreeSet;

use tracing::debug;

use crate::pipeline::RunContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Some job still has unscored pairs; run the ranking stage again.
    Wait,
    /// Every job is fully recorded; advance to cross-job comparison.
    Continue,
}

/// Compares the distinct job names of the run with the jobs fully recorded in
/// the ledger. On `Continue` the ledger is cleared: the stage that needed it is over.
pub fn check(ctx: &mut RunContext) -> GateDecision {
    let expected: BTreeSet<&str> = ctx.job_openings.iter().map(|j| j.name.as_str()).collect();
    let recorded: BTreeSet<&str> = expected
        .iter()
        .copied()
        .filter(|name| ctx.ledger.is_job_complete(name, &ctx.candidates))
        .collect();

    debug!(
        trace_id = %ctx.trace_id,
        expected = expected.len(),
        recorded = recorded.len(),
        pairs = ctx.ledger.recorded_pairs(),
        "progression gate"
    );

    if recorded == expected {
        ctx.ledger.clear();
        GateDecision::Continue
    } else {
        GateDecision::Wait
    }
}
