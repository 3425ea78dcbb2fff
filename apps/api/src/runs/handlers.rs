use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::{Candidate, JobOpening};
use crate::models::run::RunRecord;
use crate::pipeline::RunContext;
use crate::runs::worker::spawn_run;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub job_openings: Vec<JobOpening>,
    #[serde(alias = "resumes")]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub trace_id: Uuid,
    pub message: String,
}

fn check_names<'a>(
    kind: &str,
    items: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<usize, AppError> {
    let mut seen = HashSet::new();
    for (name, content) in items {
        if name.trim().is_empty() {
            return Err(AppError::Validation(format!("{kind} name must not be empty")));
        }
        if content.trim().is_empty() {
            return Err(AppError::Validation(format!("{kind} '{name}' has no content")));
        }
        if !seen.insert(name) {
            return Err(AppError::Validation(format!("duplicate {kind} name '{name}'")));
        }
    }
    if seen.is_empty() {
        return Err(AppError::Validation(format!("at least one {kind} is required")));
    }
    Ok(seen.len())
}

/// Rejects empty inputs, blank names or content, and duplicate names.
/// Names are identities for the whole run, so duplicates cannot be scored apart.
pub fn validate_inputs(jobs: &[JobOpening], candidates: &[Candidate]) -> Result<(), AppError> {
    check_names(
        "job opening",
        jobs.iter().map(|j| (j.name.as_str(), j.content.as_str())),
    )?;
    check_names(
        "candidate",
        candidates.iter().map(|c| (c.name.as_str(), c.content.as_str())),
    )?;
    Ok(())
}

/// Validates, registers a pending run and hands it to the background worker.
pub async fn start_run(
    state: &AppState,
    job_openings: Vec<JobOpening>,
    candidates: Vec<Candidate>,
) -> Result<StartResponse, AppError> {
    validate_inputs(&job_openings, &candidates)?;

    let trace_id = Uuid::new_v4();
    state
        .runs
        .create(trace_id, job_openings.iter().map(|j| j.name.as_str()))
        .await;
    info!(
        %trace_id,
        jobs = job_openings.len(),
        candidates = candidates.len(),
        "analysis accepted"
    );

    let ctx = RunContext::new(trace_id, job_openings, candidates);
    spawn_run(state.pipeline.clone(), state.runs.clone(), ctx);

    Ok(StartResponse {
        trace_id,
        message: "Analysis started".to_string(),
    })
}

/// POST /api/v1/rar/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    let response = start_run(&state, req.job_openings, req.candidates).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /api/v1/rar/status/:trace_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(trace_id): Path<String>,
) -> Result<Json<RunRecord>, AppError> {
    let not_found = || AppError::NotFound(format!("Run {trace_id} not found"));
    let id = Uuid::parse_str(&trace_id).map_err(|_| not_found())?;
    let record = state.runs.get(&id).await.ok_or_else(not_found)?;
    Ok(Json(RunRecord::clone(&record)))
}
