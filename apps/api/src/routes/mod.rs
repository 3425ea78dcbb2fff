pub mod guard;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::ingest::{handle_upload, MAX_UPLOAD_BYTES};
use crate::runs::handlers::{handle_analyze, handle_status};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Submissions start paid oracle work and are rate limited; polling is not.
    let submit = Router::new()
        .route("/analyze", post(handle_analyze))
        .route(
            "/analyze/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::rate_limit,
        ));

    let rar = Router::new()
        .merge(submit)
        .route("/status/:trace_id", get(handle_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_api_key,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1/rar", rar)
        .layer(middleware::from_fn(guard::security_headers))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::pipeline::testing::{ScriptedComparator, ScriptedScorer};
    use crate::pipeline::{Pipeline, PipelineOptions};
    use crate::routes::guard::{RateLimiter, API_KEY_HEADER};
    use crate::runs::ledger::RunLedger;

    fn test_state(api_keys: &[&str], rate_limit: u32) -> AppState {
        let config = Config {
            anthropic_api_key: "sk-test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            api_keys: api_keys.iter().map(|k| k.to_string()).collect(),
            rate_limit_per_minute: rate_limit,
            comparison_max_attempts: 3,
            comparison_retry_delay: Duration::ZERO,
            include_best_matches_per_job: true,
        };
        let scorer = ScriptedScorer::new(&[
            ("SWE", "jane.pdf", 80),
            ("SWE", "john.pdf", 60),
            ("swe.txt", "jane.txt", 75),
        ]);
        let pipeline = Pipeline::new(
            Arc::new(scorer),
            Arc::new(ScriptedComparator::failing_times(0)),
            config.pipeline_options(),
        );
        AppState {
            rate_limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
            config,
            pipeline: Arc::new(pipeline),
            runs: RunLedger::new(),
        }
    }

    fn analyze_body() -> Value {
        json!({
            "job_openings": [{"name": "SWE", "content": "Rust backend engineer"}],
            "candidates": [
                {"name": "jane.pdf", "content": "Rust, Go"},
                {"name": "john.pdf", "content": "Java"}
            ]
        })
    }

    fn post_json(uri: &str, body: &Value, api_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Polls the status endpoint until the run leaves the non-terminal states.
    async fn wait_for_terminal(app: &Router, trace_id: &str, api_key: Option<&str>) -> Value {
        for _ in 0..100 {
            let response = app
                .clone()
                .oneshot(get(&format!("/api/v1/rar/status/{trace_id}"), api_key))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            if matches!(body["status"].as_str(), Some("completed" | "failed")) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {trace_id} did not finish");
    }

    #[tokio::test]
    async fn test_health_carries_security_headers() {
        let app = build_router(test_state(&[], 5));
        let response = app.oneshot(get("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert!(headers.contains_key("strict-transport-security"));
        assert_eq!(json_body(response).await["service"], "rerank-api");
    }

    #[tokio::test]
    async fn test_analyze_runs_to_completion() {
        let app = build_router(test_state(&[], 5));
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let started = json_body(response).await;
        assert_eq!(started["message"], "Analysis started");
        let trace_id = started["trace_id"].as_str().unwrap().to_string();

        let status = wait_for_terminal(&app, &trace_id, None).await;
        assert_eq!(status["status"], "completed");
        assert_eq!(status["progress"]["SWE"], "completed");
        assert_eq!(status["result"]["best_matches_per_resume"]["jane.pdf"], "SWE");
        assert_eq!(status["rankings"]["SWE"][0]["candidate_name"], "jane.pdf");
        assert_eq!(status["rankings"]["SWE"][0]["rank"], 1);
        assert!(status["error"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_submission_is_rejected() {
        let app = build_router(test_state(&[], 5));
        let body = json!({
            "job_openings": [{"name": "SWE", "content": "Rust"}],
            "candidates": []
        });
        let response = app
            .oneshot(post_json("/api/v1/rar/analyze", &body, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_api_key_guard() {
        let app = build_router(test_state(&["alpha"], 5));

        let missing = app
            .clone()
            .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app
            .clone()
            .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), Some("beta")))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

        let ok = app
            .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), Some("alpha")))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_status_requires_key_and_known_id() {
        let app = build_router(test_state(&["alpha"], 5));

        let unauthenticated = app
            .clone()
            .oneshot(get(&format!("/api/v1/rar/status/{}", uuid::Uuid::new_v4()), None))
            .await
            .unwrap();
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let unknown = app
            .clone()
            .oneshot(get(
                &format!("/api/v1/rar/status/{}", uuid::Uuid::new_v4()),
                Some("alpha"),
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let malformed = app
            .oneshot(get("/api/v1/rar/status/not-a-uuid", Some("alpha")))
            .await
            .unwrap();
        assert_eq!(malformed.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submissions_are_rate_limited_but_polling_is_not() {
        let app = build_router(test_state(&[], 2));
        let mut trace_id = String::new();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
            trace_id = json_body(response).await["trace_id"]
                .as_str()
                .unwrap()
                .to_string();
        }

        let limited = app
            .clone()
            .oneshot(post_json("/api/v1/rar/analyze", &analyze_body(), None))
            .await
            .unwrap();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json_body(limited).await["error"]["code"], "RATE_LIMITED");

        for _ in 0..5 {
            let poll = app
                .clone()
                .oneshot(get(&format!("/api/v1/rar/status/{trace_id}"), None))
                .await
                .unwrap();
            assert_eq!(poll.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_multipart_upload_starts_run() {
        let app = build_router(test_state(&[], 5));
        let boundary = "rerank-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"job_openings\"; filename=\"swe.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             Rust backend engineer\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"resumes\"; filename=\"jane.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             Rust, Go, Kubernetes\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/v1/rar/analyze/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let trace_id = json_body(response).await["trace_id"]
            .as_str()
            .unwrap()
            .to_string();

        let status = wait_for_terminal(&app, &trace_id, None).await;
        assert_eq!(status["status"], "completed");
        assert_eq!(status["result"]["best_matches_per_resume"]["jane.txt"], "swe.txt");
    }
}
