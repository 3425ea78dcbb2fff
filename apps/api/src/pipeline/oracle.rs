//! Oracle boundary. The pipeline depends only on these two traits; the
//! production implementations go through the shared `LlmClient`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::SCHEMA_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::evaluation::{Candidate, EvaluationRecord, JobOpening, ScoreBreakdown};
use crate::pipeline::prompts::{
    comparison_system, scoring_system, COMPARISON_PROMPT_TEMPLATE, SCORING_PROMPT_TEMPLATE,
};
use crate::pipeline::schema::{ComparisonSchema, DynamicComparison};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("oracle output rejected: {0}")]
    InvalidOutput(String),
}

/// Scores one (job, candidate) pair.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn evaluate(
        &self,
        job: &JobOpening,
        candidate: &Candidate,
    ) -> Result<EvaluationRecord, OracleError>;
}

/// Compares all ranked candidates across all jobs against a per-run contract.
#[async_trait]
pub trait ComparatorOracle: Send + Sync {
    async fn compare(
        &self,
        flattened_context: &str,
        schema: &ComparisonSchema,
    ) -> Result<DynamicComparison, OracleError>;
}

/// Model output for a single evaluation. The candidate name echoed by the model
/// is ignored: the pair identity is the submitted name.
#[derive(Debug, Deserialize)]
struct EvaluationOutput {
    analysis: String,
    scores: ScoreBreakdown,
    total_score: i32,
    #[serde(default)]
    key_strengths: Vec<String>,
    #[serde(default)]
    areas_for_improvement: Vec<String>,
}

fn evaluation_schema() -> serde_json::Value {
    let score_properties: serde_json::Map<String, serde_json::Value> = ScoreBreakdown::CATEGORIES
        .iter()
        .map(|key| (key.to_string(), json!({"type": "integer"})))
        .collect();

    json!({
        "type": "object",
        "properties": {
            "candidate_name": {"type": "string"},
            "analysis": {"type": "string"},
            "scores": {
                "type": "object",
                "properties": score_properties,
                "required": ScoreBreakdown::CATEGORIES
            },
            "total_score": {"type": "integer"},
            "key_strengths": {"type": "array", "items": {"type": "string"}},
            "areas_for_improvement": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["analysis", "scores", "total_score", "key_strengths", "areas_for_improvement"]
    })
}

impl EvaluationOutput {
    fn into_record(self, candidate_name: &str) -> Result<EvaluationRecord, OracleError> {
        if self.total_score < 0 {
            return Err(OracleError::InvalidOutput(format!(
                "negative total_score {} for '{candidate_name}'",
                self.total_score
            )));
        }
        if let Some((key, value)) = self.scores.entries().into_iter().find(|(_, v)| *v < 0) {
            return Err(OracleError::InvalidOutput(format!(
                "negative {key} score {value} for '{candidate_name}'"
            )));
        }

        Ok(EvaluationRecord {
            candidate_name: candidate_name.to_string(),
            analysis: self.analysis,
            scores: self.scores,
            total_score: self.total_score,
            key_strengths: self.key_strengths,
            areas_for_improvement: self.areas_for_improvement,
        })
    }
}

pub struct LlmScoringOracle {
    llm: LlmClient,
}

impl LlmScoringOracle {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ScoringOracle for LlmScoringOracle {
    async fn evaluate(
        &self,
        job: &JobOpening,
        candidate: &Candidate,
    ) -> Result<EvaluationRecord, OracleError> {
        let prompt = SCORING_PROMPT_TEMPLATE
            .replace("{job_description}", &job.content)
            .replace("{resume_content}", &candidate.content)
            .replace("{schema_instruction}", SCHEMA_INSTRUCTION)
            .replace("{output_schema}", &evaluation_schema().to_string());

        let output: EvaluationOutput = self.llm.call_json(&prompt, &scoring_system()).await?;
        debug!(
            job = %job.name,
            candidate = %candidate.name,
            total_score = output.total_score,
            "evaluation received"
        );
        output.into_record(&candidate.name)
    }
}

pub struct LlmComparatorOracle {
    llm: LlmClient,
}

impl LlmComparatorOracle {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ComparatorOracle for LlmComparatorOracle {
    async fn compare(
        &self,
        flattened_context: &str,
        schema: &ComparisonSchema,
    ) -> Result<DynamicComparison, OracleError> {
        let prompt = COMPARISON_PROMPT_TEMPLATE
            .replace("{flattened_context}", flattened_context)
            .replace("{schema_instruction}", SCHEMA_INSTRUCTION)
            .replace("{output_schema}", &schema.to_json_schema().to_string());

        Ok(self.llm.call_json(&prompt, &comparison_system()).await?)
    }
}
