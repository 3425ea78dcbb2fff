//! Shared fixtures and scripted oracles for pipeline tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::LlmError;
use crate::models::evaluation::{Candidate, EvaluationRecord, JobOpening, ScoreBreakdown};
use crate::models::recommendation::CrossMatch;
use crate::pipeline::oracle::{ComparatorOracle, OracleError, ScoringOracle};
use crate::pipeline::schema::{ComparisonSchema, DynamicComparison};
use crate::pipeline::ProgressReporter;

pub fn job(name: &str) -> JobOpening {
    JobOpening {
        name: name.to_string(),
        content: format!("{name}: builds backend services in Rust"),
    }
}

pub fn candidate(name: &str) -> Candidate {
    Candidate {
        name: name.to_string(),
        content: format!("{name}: five years of Rust and Go"),
    }
}

pub fn record(candidate_name: &str, total_score: i32) -> EvaluationRecord {
    EvaluationRecord {
        candidate_name: candidate_name.to_string(),
        analysis: format!("{candidate_name} looks solid"),
        scores: ScoreBreakdown {
            skills_match: 20,
            experience_relevance: 20,
            education_fit: 10,
            cultural_fit: 10,
            overall_impression: 10,
        },
        total_score,
        key_strengths: vec!["Rust".to_string()],
        areas_for_improvement: vec!["Kubernetes".to_string()],
    }
}

fn overloaded() -> OracleError {
    OracleError::Llm(LlmError::Api {
        status: 529,
        message: "overloaded".to_string(),
    })
}

pub struct NoopReporter;

#[async_trait]
impl ProgressReporter for NoopReporter {
    async fn job_completed(&self, _job_name: &str) {}
}

#[derive(Default)]
pub struct RecordingReporter {
    completed: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn job_completed(&self, job_name: &str) {
        self.completed.lock().unwrap().push(job_name.to_string());
    }
}

/// Returns a fixed total score per (job, candidate) and logs every call.
/// Unscripted pairs are rejected as invalid output.
pub struct ScriptedScorer {
    scores: BTreeMap<(String, String), i32>,
    failing: Option<(String, String)>,
    delay: Duration,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedScorer {
    pub fn new(script: &[(&str, &str, i32)]) -> Self {
        Self {
            scores: script
                .iter()
                .map(|(j, c, s)| ((j.to_string(), c.to_string()), *s))
                .collect(),
            failing: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, job_name: &str, candidate_name: &str) -> Self {
        self.failing = Some((job_name.to_string(), candidate_name.to_string()));
        self
    }

    /// Sleeps before every answer so concurrent runs interleave.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringOracle for ScriptedScorer {
    async fn evaluate(
        &self,
        job: &JobOpening,
        candidate: &Candidate,
    ) -> Result<EvaluationRecord, OracleError> {
        let key = (job.name.clone(), candidate.name.clone());
        self.calls.lock().unwrap().push(key.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.as_ref() == Some(&key) {
            return Err(overloaded());
        }
        self.scores
            .get(&key)
            .map(|score| record(&candidate.name, *score))
            .ok_or_else(|| OracleError::InvalidOutput(format!("unscripted pair {key:?}")))
    }
}

/// Fails the first `failures` calls, then leaves the last candidate field
/// unanswered for the next `incomplete` calls, then answers every schema field.
/// Candidates are matched to the first job in the context and jobs to the
/// first candidate in the schema.
pub struct ScriptedComparator {
    failures: u32,
    incomplete: u32,
    calls: Mutex<u32>,
    last_context: Mutex<Option<String>>,
}

impl ScriptedComparator {
    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures,
            incomplete: 0,
            calls: Mutex::new(0),
            last_context: Mutex::new(None),
        }
    }

    pub fn incomplete_times(incomplete: u32) -> Self {
        Self {
            incomplete,
            ..Self::failing_times(0)
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    pub fn last_context(&self) -> Option<String> {
        self.last_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComparatorOracle for ScriptedComparator {
    async fn compare(
        &self,
        flattened_context: &str,
        schema: &ComparisonSchema,
    ) -> Result<DynamicComparison, OracleError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        *self.last_context.lock().unwrap() = Some(flattened_context.to_string());

        if call <= self.failures {
            return Err(overloaded());
        }

        let first_job = flattened_context
            .lines()
            .find_map(|line| line.strip_prefix("FileName: "))
            .unwrap_or_default()
            .to_string();
        let first_candidate = schema
            .candidate_fields()
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_default();

        let mut candidate_fields = schema.candidate_fields();
        if call - self.failures <= self.incomplete {
            candidate_fields = &candidate_fields[..candidate_fields.len().saturating_sub(1)];
        }

        Ok(DynamicComparison {
            job_resume_matches: vec![CrossMatch {
                job_name: first_job.clone(),
                candidate_name: first_candidate.clone(),
                match_score: 0.8,
                match_explanation: "scripted".to_string(),
            }],
            best_matches_per_job: schema
                .job_fields()
                .unwrap_or_default()
                .iter()
                .map(|f| (f.field_id.clone(), first_candidate.clone()))
                .collect(),
            best_matches_per_resume: candidate_fields
                .iter()
                .map(|f| (f.field_id.clone(), first_job.clone()))
                .collect(),
            overall_recommendation: "scripted recommendation".to_string(),
        })
    }
}
