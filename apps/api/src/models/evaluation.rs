use serde::{Deserialize, Serialize};

/// A job opening submitted for a run. `name` is unique within the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobOpening {
    pub name: String,
    pub content: String,
}

/// A candidate résumé. `name` is unique within the run and usually the source file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "CandidateInput")]
pub struct Candidate {
    pub name: String,
    pub content: String,
}

/// Accepted wire shapes for a candidate: the native `{name, content}` and the
/// document shape `{page_content, metadata: {source}}` older clients still send.
#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateInput {
    Named {
        name: String,
        content: String,
    },
    Document {
        page_content: String,
        metadata: DocumentMetadata,
    },
}

#[derive(Deserialize)]
struct DocumentMetadata {
    source: String,
}

impl From<CandidateInput> for Candidate {
    fn from(input: CandidateInput) -> Self {
        match input {
            CandidateInput::Named { name, content } => Candidate { name, content },
            CandidateInput::Document {
                page_content,
                metadata,
            } => Candidate {
                name: metadata.source,
                content: page_content,
            },
        }
    }
}

/// Per-category sub-scores returned by the scoring oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub skills_match: i32,
    pub experience_relevance: i32,
    pub education_fit: i32,
    pub cultural_fit: i32,
    pub overall_impression: i32,
}

impl ScoreBreakdown {
    /// Category keys in display order.
    pub const CATEGORIES: [&'static str; 5] = [
        "skills_match",
        "experience_relevance",
        "education_fit",
        "cultural_fit",
        "overall_impression",
    ];

    pub fn entries(&self) -> [(&'static str, i32); 5] {
        [
            (Self::CATEGORIES[0], self.skills_match),
            (Self::CATEGORIES[1], self.experience_relevance),
            (Self::CATEGORIES[2], self.education_fit),
            (Self::CATEGORIES[3], self.cultural_fit),
            (Self::CATEGORIES[4], self.overall_impression),
        ]
    }
}

/// Outcome of scoring one (job, candidate) pair. Immutable once created.
///
/// `total_score` is the ranking key as reported by the oracle. It is NOT derived
/// from `scores` and must never be recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluationRecord {
    pub candidate_name: String,
    pub analysis: String,
    pub scores: ScoreBreakdown,
    pub total_score: i32,
    pub key_strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

/// An evaluation annotated with its 1-based position in a job's ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankedEvaluation {
    pub rank: usize,
    #[serde(flatten)]
    pub record: EvaluationRecord,
}
