//! Dynamic Schema Builder: the per-run output contract of the comparison oracle.
//!
//! The comparison oracle must answer with one "best candidate" per job and one
//! "best job" per candidate, and those names are only known at request time.
//! Names become property identifiers by replacing every non-alphanumeric
//! character with `_`. That mapping is not injective ("Job A" and "Job-A"
//! collide), so every fragment goes through a collision pass and a clash is a
//! fatal configuration error raised before the oracle is called.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::models::evaluation::{Candidate, JobOpening};
use crate::models::recommendation::CrossMatch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema collision in {fragment}: '{first}' and '{second}' both map to field '{field_id}'")]
pub struct SchemaCollision {
    pub fragment: &'static str,
    pub field_id: String,
    pub first: String,
    pub second: String,
}

/// Replaces every character that is not alphanumeric with `_`.
pub fn sanitize_field_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// An original name and the identifier it is exposed under in the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_id: String,
}

/// Builds one fragment, rejecting two names that sanitize to the same identifier.
fn build_fragment<'a>(
    fragment: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<SchemaField>, SchemaCollision> {
    let mut seen: HashMap<String, &'a str> = HashMap::new();
    let mut fields = Vec::new();

    for name in names {
        let field_id = sanitize_field_name(name);
        if let Some(first) = seen.get(&field_id) {
            return Err(SchemaCollision {
                fragment,
                field_id,
                first: first.to_string(),
                second: name.to_string(),
            });
        }
        seen.insert(field_id.clone(), name);
        fields.push(SchemaField {
            name: name.to_string(),
            field_id,
        });
    }

    Ok(fields)
}

/// Response contract for one comparison call, shaped by the run's names.
#[derive(Debug, Clone)]
pub struct ComparisonSchema {
    job_fields: Option<Vec<SchemaField>>,
    candidate_fields: Vec<SchemaField>,
}

impl ComparisonSchema {
    pub const BEST_PER_JOB: &'static str = "best_matches_per_job";
    pub const BEST_PER_RESUME: &'static str = "best_matches_per_resume";

    /// `include_per_job` controls whether the per-job fragment is part of the contract.
    pub fn build(
        jobs: &[JobOpening],
        candidates: &[Candidate],
        include_per_job: bool,
    ) -> Result<Self, SchemaCollision> {
        let job_fields = if include_per_job {
            Some(build_fragment(
                Self::BEST_PER_JOB,
                jobs.iter().map(|j| j.name.as_str()),
            )?)
        } else {
            None
        };
        let candidate_fields = build_fragment(
            Self::BEST_PER_RESUME,
            candidates.iter().map(|c| c.name.as_str()),
        )?;

        Ok(Self {
            job_fields,
            candidate_fields,
        })
    }

    pub fn job_fields(&self) -> Option<&[SchemaField]> {
        self.job_fields.as_deref()
    }

    pub fn candidate_fields(&self) -> &[SchemaField] {
        &self.candidate_fields
    }

    /// Renders the contract as a JSON Schema document for the prompt.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        properties.insert(
            "job_resume_matches".to_string(),
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "job_name": {"type": "string"},
                        "candidate_name": {"type": "string"},
                        "match_score": {"type": "number"},
                        "match_explanation": {"type": "string"}
                    },
                    "required": ["job_name", "candidate_name", "match_score", "match_explanation"]
                }
            }),
        );

        let mut required = vec![json!("job_resume_matches")];
        if let Some(job_fields) = &self.job_fields {
            properties.insert(
                Self::BEST_PER_JOB.to_string(),
                fragment_schema(job_fields, "Name of the best candidate for job"),
            );
            required.push(json!(Self::BEST_PER_JOB));
        }
        properties.insert(
            Self::BEST_PER_RESUME.to_string(),
            fragment_schema(&self.candidate_fields, "Name of the best job for candidate"),
        );
        required.push(json!(Self::BEST_PER_RESUME));

        properties.insert(
            "overall_recommendation".to_string(),
            json!({"type": "string"}),
        );
        required.push(json!("overall_recommendation"));

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }
}

fn fragment_schema(fields: &[SchemaField], description: &str) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| {
            (
                f.field_id.clone(),
                json!({"type": "string", "description": format!("{description} '{}'", f.name)}),
            )
        })
        .collect();
    let required: Vec<&str> = fields.iter().map(|f| f.field_id.as_str()).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

/// What the comparison oracle returns: the fixed fields plus two mappings keyed
/// by sanitized identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DynamicComparison {
    pub job_resume_matches: Vec<CrossMatch>,
    #[serde(default)]
    pub best_matches_per_job: BTreeMap<String, String>,
    pub best_matches_per_resume: BTreeMap<String, String>,
    pub overall_recommendation: String,
}
