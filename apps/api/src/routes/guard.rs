//! Request guards: API-key check, per-key rate limit, security headers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
const ANONYMOUS: &str = "anonymous";

/// Identity used for rate limiting, set by `require_api_key`.
#[derive(Debug, Clone)]
pub struct ClientKey(pub String);

/// Fixed-window request counter per client key.
#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, (Instant, u32)>>>,
}

impl RateLimiter {
    /// A `limit` of zero disables limiting.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Arc::default(),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Counts one request for `key`; false once the window's budget is spent.
    pub async fn check(&self, key: &str) -> bool {
        if self.limit == 0 {
            return true;
        }
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let (started, count) = windows.entry(key.to_string()).or_insert((now, 0));
        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= self.limit {
            return false;
        }
        *count += 1;
        true
    }
}

pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = if state.config.api_keys.is_empty() {
        ANONYMOUS.to_string()
    } else {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        if !state.config.api_keys.iter().any(|k| k == provided) {
            warn!(path = %request.uri().path(), "rejected unknown API key");
            return Err(AppError::Forbidden);
        }
        provided.to_string()
    };

    request.extensions_mut().insert(ClientKey(client));
    Ok(next.run(request).await)
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = request
        .extensions()
        .get::<ClientKey>()
        .map_or_else(|| ANONYMOUS.to_string(), |k| k.0.clone());
    if !state.rate_limiter.check(&key).await {
        warn!(path = %request.uri().path(), "rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}

pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    response
}
