use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::routes::guard::RateLimiter;
use crate::runs::ledger::RunLedger;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless orchestrator shared by every run; per-run state lives in `RunContext`.
    pub pipeline: Arc<Pipeline>,
    pub runs: RunLedger,
    pub rate_limiter: RateLimiter,
}
