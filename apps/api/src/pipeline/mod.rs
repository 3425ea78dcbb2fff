//! Evaluation-and-comparison pipeline.
//!
//! Flow: ranking stage (score every unscored pair, rebuild per-job rankings) →
//! progression gate (loop back while any job is incomplete) → dynamic schema →
//! cross-job comparison with bounded retry → `FinalRecommendation`.
//!
//! Every run owns its own `RunContext`; nothing here is shared between runs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::evaluation::{Candidate, EvaluationRecord, JobOpening};
use crate::models::recommendation::FinalRecommendation;

pub mod comparator;
pub mod gate;
pub mod ledger;
pub mod oracle;
pub mod prompts;
pub mod ranking;
pub mod retry;
pub mod schema;

#[cfg(test)]
pub mod testing;

use self::gate::GateDecision;
use self::ledger::PairLedger;
use self::oracle::{ComparatorOracle, OracleError, ScoringOracle};
use self::ranking::RankingTable;
use self::retry::RetryPolicy;
use self::schema::SchemaCollision;

/// Run-fatal errors. The display text is what pollers see in `RunRecord.error`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("scoring '{candidate}' against '{job}' failed: {source}")]
    Scoring {
        job: String,
        candidate: String,
        source: OracleError,
    },

    #[error("cross-job comparison failed after {attempts} attempt(s): {source}")]
    Comparison { attempts: u32, source: OracleError },

    #[error(transparent)]
    SchemaCollision(#[from] SchemaCollision),

    #[error("ranking stage stalled after {passes} pass(es) with jobs still incomplete")]
    Stalled { passes: u32 },
}

/// Receives per-job progress from the ranking stage.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn job_completed(&self, job_name: &str);
}

/// Everything one run mutates: its inputs, pair ledger, evaluations and rankings.
/// Serializable so an interrupted run can be restored and resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    pub trace_id: Uuid,
    pub job_openings: Vec<JobOpening>,
    pub candidates: Vec<Candidate>,
    pub ledger: PairLedger,
    /// Job name → evaluations in scoring order.
    evaluations: BTreeMap<String, Vec<EvaluationRecord>>,
    pub rankings: RankingTable,
}

impl RunContext {
    pub fn new(trace_id: Uuid, job_openings: Vec<JobOpening>, candidates: Vec<Candidate>) -> Self {
        Self {
            trace_id,
            job_openings,
            candidates,
            ledger: PairLedger::new(),
            evaluations: BTreeMap::new(),
            rankings: RankingTable::default(),
        }
    }
}

/// Output-shape options for the comparison stage.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub include_best_matches_per_job: bool,
    pub comparison_retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_best_matches_per_job: true,
            comparison_retry: RetryPolicy::fixed(3, Duration::from_secs(2)),
        }
    }
}

/// The orchestrator. Stateless between runs; cheap to share behind an `Arc`.
pub struct Pipeline {
    scorer: Arc<dyn ScoringOracle>,
    comparator: Arc<dyn ComparatorOracle>,
    scoring_retry: RetryPolicy,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        scorer: Arc<dyn ScoringOracle>,
        comparator: Arc<dyn ComparatorOracle>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            scorer,
            comparator,
            scoring_retry: RetryPolicy::single_attempt(),
            options,
        }
    }

    /// Drives one run to its terminal result.
    pub async fn run(
        &self,
        ctx: &mut RunContext,
        reporter: &dyn ProgressReporter,
    ) -> Result<FinalRecommendation, PipelineError> {
        let mut passes = 0;
        loop {
            passes += 1;
            let pass = ranking::rank_candidates(
                ctx,
                self.scorer.as_ref(),
                &self.scoring_retry,
                reporter,
            )
            .await?;

            match gate::check(ctx) {
                GateDecision::Continue => {
                    info!(trace_id = %ctx.trace_id, passes, "all jobs ranked");
                    break;
                }
                GateDecision::Wait if pass.scored == 0 => {
                    return Err(PipelineError::Stalled { passes });
                }
                GateDecision::Wait => {
                    debug!(trace_id = %ctx.trace_id, passes, scored = pass.scored, "jobs incomplete, ranking again");
                }
            }
        }

        comparator::compare_across_jobs(
            ctx,
            self.comparator.as_ref(),
            &self.options.comparison_retry,
            self.options.include_best_matches_per_job,
        )
        .await
    }
}
