use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::PipelineOptions;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Accepted `x-api-key` values. Empty disables the guard.
    pub api_keys: Vec<String>,
    pub rate_limit_per_minute: u32,
    pub comparison_max_attempts: u32,
    pub comparison_retry_delay: Duration,
    pub include_best_matches_per_job: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY")
                .filter(|v| !v.is_empty())
                .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")?,
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
            api_keys: var("RAR_API_KEYS", "")
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
            rate_limit_per_minute: var("RATE_LIMIT_PER_MINUTE", "5")
                .parse::<u32>()
                .context("RATE_LIMIT_PER_MINUTE must be a non-negative integer")?,
            comparison_max_attempts: var("COMPARISON_MAX_ATTEMPTS", "3")
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .context("COMPARISON_MAX_ATTEMPTS must be a positive integer")?,
            comparison_retry_delay: Duration::from_secs(
                var("COMPARISON_RETRY_DELAY_SECS", "2")
                    .parse::<u64>()
                    .context("COMPARISON_RETRY_DELAY_SECS must be a number of seconds")?,
            ),
            include_best_matches_per_job: var("INCLUDE_BEST_MATCHES_PER_JOB", "true")
                .parse::<bool>()
                .context("INCLUDE_BEST_MATCHES_PER_JOB must be 'true' or 'false'")?,
        })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            include_best_matches_per_job: self.include_best_matches_per_job,
            comparison_retry: RetryPolicy::fixed(
                self.comparison_max_attempts,
                self.comparison_retry_delay,
            ),
        }
    }
}
