//! Run Ledger: in-memory store of `RunRecord`s, keyed by trace id.
//!
//! Records are immutable snapshots behind `Arc`; every change swaps the whole
//! record under the write lock, so a poller never observes a half-applied update.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::models::evaluation::RankedEvaluation;
use crate::models::recommendation::FinalRecommendation;
use crate::models::run::RunRecord;

#[derive(Clone, Default)]
pub struct RunLedger {
    runs: Arc<RwLock<HashMap<Uuid, Arc<RunRecord>>>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending run covering `job_names`.
    pub async fn create<'a>(
        &self,
        trace_id: Uuid,
        job_names: impl IntoIterator<Item = &'a str>,
    ) -> Arc<RunRecord> {
        let record = Arc::new(RunRecord::pending(trace_id, job_names));
        self.runs.write().await.insert(trace_id, record.clone());
        record
    }

    pub async fn get(&self, trace_id: &Uuid) -> Option<Arc<RunRecord>> {
        self.runs.read().await.get(trace_id).cloned()
    }

    /// Applies `next` to the current record and stores the result. Returns
    /// false for unknown runs and rejected transitions; the record is unchanged.
    async fn replace<F>(&self, trace_id: &Uuid, action: &str, next: F) -> bool
    where
        F: FnOnce(&RunRecord) -> Option<RunRecord>,
    {
        let mut runs = self.runs.write().await;
        let Some(current) = runs.get(trace_id) else {
            warn!(%trace_id, action, "unknown run");
            return false;
        };
        match next(current) {
            Some(updated) => {
                runs.insert(*trace_id, Arc::new(updated));
                true
            }
            None => {
                warn!(%trace_id, action, status = current.status.as_str(), "transition rejected");
                false
            }
        }
    }

    pub async fn mark_running(&self, trace_id: &Uuid) -> bool {
        self.replace(trace_id, "start", RunRecord::started).await
    }

    pub async fn job_completed(&self, trace_id: &Uuid, job_name: &str) -> bool {
        self.replace(trace_id, "job_completed", |r| r.with_job_completed(job_name))
            .await
    }

    pub async fn complete(
        &self,
        trace_id: &Uuid,
        result: FinalRecommendation,
        rankings: BTreeMap<String, Vec<RankedEvaluation>>,
    ) -> bool {
        self.replace(trace_id, "complete", |r| r.completed(result, rankings))
            .await
    }

    pub async fn fail(&self, trace_id: &Uuid, error: String) -> bool {
        self.replace(trace_id, "fail", |r| r.failed(error)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::run::{JobProgress, RunStatus};

    fn recommendation() -> FinalRecommendation {
        FinalRecommendation {
            job_resume_matches: vec![],
            best_matches_per_job: None,
            best_matches_per_resume: BTreeMap::from([("a.pdf".to_string(), "SWE".to_string())]),
            overall_recommendation: "hire a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_replaces_records() {
        let runs = RunLedger::new();
        let id = Uuid::new_v4();
        let pending = runs.create(id, ["SWE"]).await;

        assert!(runs.mark_running(&id).await);
        assert!(runs.job_completed(&id, "SWE").await);
        let running = runs.get(&id).await.unwrap();
        assert_eq!(running.status, RunStatus::Running);
        assert_eq!(running.progress["SWE"], JobProgress::Completed);

        assert!(runs.complete(&id, recommendation(), BTreeMap::new()).await);
        let done = runs.get(&id).await.unwrap();
        assert_eq!(done.status, RunStatus::Completed);
        assert!(done.result.is_some());

        // earlier snapshots are untouched
        assert_eq!(pending.status, RunStatus::Pending);
        assert_eq!(running.status, RunStatus::Running);
        assert!(running.result.is_none());
    }

    #[tokio::test]
    async fn test_terminal_records_reject_further_transitions() {
        let runs = RunLedger::new();
        let id = Uuid::new_v4();
        runs.create(id, ["SWE"]).await;
        runs.mark_running(&id).await;
        assert!(runs.fail(&id, "oracle down".to_string()).await);

        assert!(!runs.complete(&id, recommendation(), BTreeMap::new()).await);
        assert!(!runs.job_completed(&id, "SWE").await);
        let record = runs.get(&id).await.unwrap();
        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("oracle down"));
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_pending_run_cannot_complete() {
        let runs = RunLedger::new();
        let id = Uuid::new_v4();
        runs.create(id, ["SWE"]).await;

        assert!(!runs.complete(&id, recommendation(), BTreeMap::new()).await);
        assert_eq!(runs.get(&id).await.unwrap().status, RunStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_run() {
        let runs = RunLedger::new();
        let id = Uuid::new_v4();
        assert!(runs.get(&id).await.is_none());
        assert!(!runs.mark_running(&id).await);
    }
}
