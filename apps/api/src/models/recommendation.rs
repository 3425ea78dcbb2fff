use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One job/candidate pairing judged by the comparison oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossMatch {
    #[serde(alias = "job_description_name")]
    pub job_name: String,
    pub candidate_name: String,
    pub match_score: f64,
    pub match_explanation: String,
}

/// Terminal result of a run, keyed by the original (unsanitized) names.
///
/// Every candidate of the run appears exactly once in `best_matches_per_resume`.
/// `best_matches_per_job` is present only when the deployment enables it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalRecommendation {
    pub job_resume_matches: Vec<CrossMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_matches_per_job: Option<BTreeMap<String, String>>,
    pub best_matches_per_resume: BTreeMap<String, String>,
    pub overall_recommendation: String,
}
