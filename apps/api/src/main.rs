mod config;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod runs;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::oracle::{LlmComparatorOracle, LlmScoringOracle};
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::routes::guard::RateLimiter;
use crate::runs::ledger::RunLedger;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rerank API v{}", env!("CARGO_PKG_VERSION"));

    // Both oracles share one LLM client (and its connection pool)
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let options = config.pipeline_options();
    info!(
        "Comparison retry: {} attempt(s), {:?} apart; best_matches_per_job: {}",
        options.comparison_retry.max_attempts,
        options.comparison_retry.delay,
        options.include_best_matches_per_job
    );
    let pipeline = Pipeline::new(
        Arc::new(LlmScoringOracle::new(llm.clone())),
        Arc::new(LlmComparatorOracle::new(llm)),
        options,
    );

    if config.api_keys.is_empty() {
        tracing::warn!("No API keys configured; the API key guard is disabled");
    }

    // Build app state
    let state = AppState {
        rate_limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
        config: config.clone(),
        pipeline: Arc::new(pipeline),
        runs: RunLedger::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
