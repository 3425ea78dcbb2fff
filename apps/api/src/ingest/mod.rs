//! Multipart ingestion: job posting files and résumé files become
//! `JobOpening` / `Candidate` records named after their file names.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::evaluation::{Candidate, JobOpening};
use crate::runs::handlers::{start_run, StartResponse};
use crate::state::AppState;

pub const JOB_OPENINGS_FIELD: &str = "job_openings";
pub const RESUMES_FIELD: &str = "resumes";

/// Uploads beyond this size are rejected before the handler runs.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

fn is_pdf(file_name: &str, data: &[u8]) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf") || data.starts_with(b"%PDF")
}

fn read_text(file_name: &str, data: Bytes) -> Result<String, AppError> {
    String::from_utf8(data.to_vec())
        .map_err(|_| AppError::Validation(format!("'{file_name}' is not valid UTF-8 text")))
}

/// Extracts the text layer of a PDF. Runs on the blocking pool; the extractor
/// can panic on malformed input, which surfaces as a join error.
async fn read_pdf(file_name: &str, data: Bytes) -> Result<String, AppError> {
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| e.to_string())
        .and_then(|res| res.map_err(|e| e.to_string()));

    match extracted {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            warn!(file = file_name, "PDF extraction failed: {e}");
            Err(AppError::Validation(format!(
                "could not extract text from '{file_name}'"
            )))
        }
    }
}

/// Résumés may be PDF or plain text.
pub async fn read_resume(file_name: &str, data: Bytes) -> Result<String, AppError> {
    if is_pdf(file_name, &data) {
        read_pdf(file_name, data).await
    } else {
        read_text(file_name, data)
    }
}

/// Splits a multipart body into job openings and candidates.
pub async fn collect_uploads(
    mut multipart: Multipart,
) -> Result<(Vec<JobOpening>, Vec<Candidate>), AppError> {
    let mut jobs = Vec::new();
    let mut candidates = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let part = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(AppError::Validation(format!(
                "part '{part}' must be a file upload"
            )));
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read '{file_name}': {e}")))?;
        debug!(part = %part, file = %file_name, bytes = data.len(), "received upload");

        match part.as_str() {
            JOB_OPENINGS_FIELD => {
                let content = read_text(&file_name, data)?;
                jobs.push(JobOpening {
                    name: file_name,
                    content,
                });
            }
            RESUMES_FIELD => {
                let content = read_resume(&file_name, data).await?;
                candidates.push(Candidate {
                    name: file_name,
                    content,
                });
            }
            other => {
                return Err(AppError::Validation(format!(
                    "unexpected part '{other}'; expected '{JOB_OPENINGS_FIELD}' or '{RESUMES_FIELD}'"
                )))
            }
        }
    }

    Ok((jobs, candidates))
}

/// POST /api/v1/rar/analyze/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<StartResponse>), AppError> {
    let (jobs, candidates) = collect_uploads(multipart).await?;
    let response = start_run(&state, jobs, candidates).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}
