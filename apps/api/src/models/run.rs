use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::evaluation::RankedEvaluation;
use crate::models::recommendation::FinalRecommendation;

/// Lifecycle of one submitted run: `Pending -> Running -> {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    pub fn can_transition_to(self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

/// Per-job progress as seen by pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobProgress {
    Pending,
    Completed,
}

/// Snapshot of a run. Records are replaced whole on every change, never patched
/// field by field, so a reader always sees a consistent status/progress/result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub trace_id: Uuid,
    pub status: RunStatus,
    pub progress: BTreeMap<String, JobProgress>,
    pub result: Option<FinalRecommendation>,
    /// Per-job rankings, filled alongside `result`.
    pub rankings: Option<BTreeMap<String, Vec<RankedEvaluation>>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunRecord {
    pub fn pending<'a>(trace_id: Uuid, job_names: impl IntoIterator<Item = &'a str>) -> Self {
        let now = Utc::now();
        Self {
            trace_id,
            status: RunStatus::Pending,
            progress: job_names
                .into_iter()
                .map(|name| (name.to_string(), JobProgress::Pending))
                .collect(),
            result: None,
            rankings: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy moved to `next`, or `None` when the transition is not allowed.
    fn advanced(&self, next: RunStatus) -> Option<Self> {
        if !self.status.can_transition_to(next) {
            return None;
        }
        Some(Self {
            status: next,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    pub fn started(&self) -> Option<Self> {
        self.advanced(RunStatus::Running)
    }

    pub fn with_job_completed(&self, job_name: &str) -> Option<Self> {
        if self.status != RunStatus::Running {
            return None;
        }
        let mut next = self.clone();
        next.progress
            .insert(job_name.to_string(), JobProgress::Completed);
        next.updated_at = Utc::now();
        Some(next)
    }

    pub fn completed(
        &self,
        result: FinalRecommendation,
        rankings: BTreeMap<String, Vec<RankedEvaluation>>,
    ) -> Option<Self> {
        let mut next = self.advanced(RunStatus::Completed)?;
        next.result = Some(result);
        next.rankings = Some(rankings);
        Some(next)
    }

    pub fn failed(&self, error: String) -> Option<Self> {
        let mut next = self.advanced(RunStatus::Failed)?;
        next.error = Some(error);
        next.result = None;
        next.rankings = None;
        Some(next)
    }
}
