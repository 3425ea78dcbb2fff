//! Background execution of a run. The submit handler returns as soon as the
//! run is registered; everything after that happens here.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::pipeline::{Pipeline, ProgressReporter, RunContext};
use crate::runs::ledger::RunLedger;

/// Publishes per-job progress to the run ledger as the ranking stage advances.
struct RunProgress<'a> {
    runs: &'a RunLedger,
    trace_id: Uuid,
}

#[async_trait]
impl ProgressReporter for RunProgress<'_> {
    async fn job_completed(&self, job_name: &str) {
        if !self.runs.job_completed(&self.trace_id, job_name).await {
            warn!(job = job_name, "progress not recorded");
        }
    }
}

/// Runs the pipeline on its own task and supervises it: a panic inside the
/// pipeline still leaves the run `Failed` instead of `Running` forever.
pub fn spawn_run(pipeline: Arc<Pipeline>, runs: RunLedger, ctx: RunContext) -> JoinHandle<()> {
    let trace_id = ctx.trace_id;
    let span = tracing::info_span!("run", %trace_id);

    let worker_runs = runs.clone();
    let worker = tokio::spawn(
        async move { execute_run(&pipeline, &worker_runs, ctx).await }.instrument(span.clone()),
    );

    tokio::spawn(
        async move {
            if let Err(e) = worker.await {
                error!("run task aborted: {e}");
                if !runs.fail(&trace_id, format!("run aborted: {e}")).await {
                    warn!("aborted run could not be marked failed");
                }
            }
        }
        .instrument(span),
    )
}

/// Drives one run to a terminal record. Never panics on pipeline failure:
/// the error text ends up on the record instead.
pub async fn execute_run(pipeline: &Pipeline, runs: &RunLedger, mut ctx: RunContext) {
    let trace_id = ctx.trace_id;
    if !runs.mark_running(&trace_id).await {
        return;
    }
    info!(
        jobs = ctx.job_openings.len(),
        candidates = ctx.candidates.len(),
        "run started"
    );

    let reporter = RunProgress {
        runs,
        trace_id,
    };
    match pipeline.run(&mut ctx, &reporter).await {
        Ok(result) => {
            if runs
                .complete(&trace_id, result, ctx.rankings.ranked_view())
                .await
            {
                info!("run completed");
            } else {
                warn!("result discarded: run record rejected completion");
            }
        }
        Err(e) => {
            error!("run failed: {e}");
            if !runs.fail(&trace_id, e.to_string()).await {
                warn!("run record rejected failure");
            }
        }
    }
}
