//! Per-job ranking: the ranking table and the stage that fills it.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::evaluation::{Candidate, EvaluationRecord, JobOpening, RankedEvaluation};
use crate::pipeline::oracle::ScoringOracle;
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::{PipelineError, ProgressReporter, RunContext};

/// Ranking order: `total_score` descending, ties by candidate name
/// case-insensitive ascending, then by exact name so the order is total.
fn ranking_order(a: &EvaluationRecord, b: &EvaluationRecord) -> Ordering {
    b.total_score
        .cmp(&a.total_score)
        .then_with(|| {
            a.candidate_name
                .to_lowercase()
                .cmp(&b.candidate_name.to_lowercase())
        })
        .then_with(|| a.candidate_name.cmp(&b.candidate_name))
}

/// Orders a job's full set of evaluations.
pub fn assemble_ranking(records: &[EvaluationRecord]) -> Vec<EvaluationRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(ranking_order);
    ranked
}

/// Job name → evaluations in ranking order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankingTable {
    jobs: BTreeMap<String, Vec<EvaluationRecord>>,
}

impl RankingTable {
    /// Replaces a job's ranking with a fresh ordering of `records`.
    pub fn rebuild(&mut self, job_name: &str, records: &[EvaluationRecord]) {
        self.jobs
            .insert(job_name.to_string(), assemble_ranking(records));
    }

    pub fn get(&self, job_name: &str) -> Option<&[EvaluationRecord]> {
        self.jobs.get(job_name).map(Vec::as_slice)
    }

    /// The job's ranking with 1-based ranks attached.
    pub fn ranked(&self, job_name: &str) -> Vec<RankedEvaluation> {
        self.get(job_name)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(idx, record)| RankedEvaluation {
                rank: idx + 1,
                record: record.clone(),
            })
            .collect()
    }

    pub fn ranked_view(&self) -> BTreeMap<String, Vec<RankedEvaluation>> {
        self.jobs
            .keys()
            .map(|job| (job.clone(), self.ranked(job)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// What one pass of the ranking stage did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankingPass {
    pub scored: usize,
    pub jobs_ranked: Vec<String>,
}

/// One pass of the ranking stage.
///
/// Jobs are visited in input order and candidates in input order within a job.
/// Pairs already in the ledger are skipped, so re-running a pass over a fully
/// recorded run makes no oracle call and leaves the ranking table untouched.
/// Any scoring failure ends the pass (and the run) with no retry beyond `policy`.
pub async fn rank_candidates(
    ctx: &mut RunContext,
    scorer: &dyn ScoringOracle,
    policy: &RetryPolicy,
    reporter: &dyn ProgressReporter,
) -> Result<RankingPass, PipelineError> {
    let RunContext {
        trace_id,
        job_openings,
        candidates,
        ledger,
        evaluations,
        rankings,
    } = ctx;
    let trace_id = *trace_id;
    let job_openings: &[JobOpening] = job_openings;
    let candidates: &[Candidate] = candidates;
    let mut pass = RankingPass::default();

    for job in job_openings.iter() {
        if ledger.is_job_complete(&job.name, candidates) && rankings.get(&job.name).is_some() {
            debug!(%trace_id, job = %job.name, "job already ranked, skipping");
            continue;
        }
        ledger.open(&job.name);

        for candidate in candidates.iter() {
            if ledger.is_recorded(&job.name, &candidate.name) {
                continue;
            }

            info!(%trace_id, job = %job.name, candidate = %candidate.name, "scoring pair");
            let record = policy
                .run("scoring", |_| true, || scorer.evaluate(job, candidate))
                .await
                .map_err(|e| PipelineError::Scoring {
                    job: job.name.clone(),
                    candidate: candidate.name.clone(),
                    source: e.source,
                })?;

            evaluations
                .entry(job.name.clone())
                .or_default()
                .push(record);
            ledger.record(&job.name, &candidate.name);
            pass.scored += 1;
        }

        let job_records = evaluations
            .get(&job.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        rankings.rebuild(&job.name, job_records);
        info!(%trace_id, job = %job.name, candidates = job_records.len(), "job ranked");

        reporter.job_completed(&job.name).await;
        pass.jobs_ranked.push(job.name.clone());
    }

    Ok(pass)
}
