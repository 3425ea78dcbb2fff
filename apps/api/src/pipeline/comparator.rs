//! Cross-Job Comparator: flattens the rankings, calls the comparison oracle
//! under the retry policy and maps the per-run response back onto
//! `FinalRecommendation`.

use std::collections::BTreeMap;

use tracing::info;

use crate::models::evaluation::JobOpening;
use crate::models::recommendation::FinalRecommendation;
use crate::pipeline::oracle::{ComparatorOracle, OracleError};
use crate::pipeline::ranking::RankingTable;
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::schema::{ComparisonSchema, DynamicComparison, SchemaField};
use crate::pipeline::{PipelineError, RunContext};

/// Renders every job (input order) followed by its ranked candidates as
/// labeled text. This is the only context the comparison oracle sees.
pub fn flatten_context(jobs: &[JobOpening], rankings: &RankingTable) -> String {
    let mut out = String::new();

    for job in jobs {
        out.push_str(&format!(
            "# Job Openings:\nFileName: {}\n{}\n\n# Resume Ranking and Analysis:\n",
            job.name, job.content
        ));

        for ranked in rankings.ranked(&job.name) {
            let record = &ranked.record;
            let scores = record
                .scores
                .entries()
                .iter()
                .map(|(key, value)| format!("{key} - {value}"))
                .collect::<Vec<_>>()
                .join("\n\t");
            out.push_str(&format!(
                "\n## Rank {}\n## Candidate Name: {}\n## Analysis: {}\n## Scores: {}\n## Total Score: {}\n## Key Strengths: {}\n## Areas for Improvement: {}\n",
                ranked.rank,
                record.candidate_name,
                record.analysis,
                scores,
                record.total_score,
                record.key_strengths.join(", "),
                record.areas_for_improvement.join(", "),
            ));
        }
        out.push('\n');
    }

    out
}

fn read_fragment(
    fragment: &'static str,
    fields: &[SchemaField],
    values: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, OracleError> {
    fields
        .iter()
        .map(|field| {
            values
                .get(&field.field_id)
                .map(|value| (field.name.clone(), value.clone()))
                .ok_or_else(|| {
                    OracleError::InvalidOutput(format!(
                        "comparison response is missing {fragment}.{} (for '{}')",
                        field.field_id, field.name
                    ))
                })
        })
        .collect()
}

/// Maps sanitized identifiers back to the original names. Every field of the
/// contract must be answered; an incomplete response is invalid oracle output.
/// The match list and narrative are copied verbatim.
pub fn reconcile(
    schema: &ComparisonSchema,
    response: DynamicComparison,
) -> Result<FinalRecommendation, OracleError> {
    let best_matches_per_job = schema
        .job_fields()
        .map(|fields| {
            read_fragment(
                ComparisonSchema::BEST_PER_JOB,
                fields,
                &response.best_matches_per_job,
            )
        })
        .transpose()?;
    let best_matches_per_resume = read_fragment(
        ComparisonSchema::BEST_PER_RESUME,
        schema.candidate_fields(),
        &response.best_matches_per_resume,
    )?;

    Ok(FinalRecommendation {
        job_resume_matches: response.job_resume_matches,
        best_matches_per_job,
        best_matches_per_resume,
        overall_recommendation: response.overall_recommendation,
    })
}

/// Runs the comparison stage for a fully ranked run.
///
/// The contract is built first, so a name collision fails the run before any
/// oracle call. Oracle failures of any kind, including a response that does not
/// answer every contract field, are retried under `policy`.
pub async fn compare_across_jobs(
    ctx: &RunContext,
    oracle: &dyn ComparatorOracle,
    policy: &RetryPolicy,
    include_per_job: bool,
) -> Result<FinalRecommendation, PipelineError> {
    let schema = ComparisonSchema::build(&ctx.job_openings, &ctx.candidates, include_per_job)?;
    let context = flatten_context(&ctx.job_openings, &ctx.rankings);

    info!(
        trace_id = %ctx.trace_id,
        jobs = ctx.job_openings.len(),
        candidates = ctx.candidates.len(),
        context_bytes = context.len(),
        "running cross-job comparison"
    );

    let (context, schema) = (&context, &schema);
    policy
        .run("cross-job comparison", |_| true, move || async move {
            let response = oracle.compare(&context, &schema).await?;
            reconcile(&schema, response)
        })
        .await
        .map_err(|e| PipelineError::Comparison {
            attempts: e.attempts,
            source: e.source,
        })
}
