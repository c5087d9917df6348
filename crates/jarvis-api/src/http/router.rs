//! Axum router configuration with middleware.
//!
//! Middleware: open CORS and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        .route("/chat", post(handlers::chat::chat))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{Value, json};

    use super::*;
    use jarvis_core::llm::box_provider::BoxLlmProvider;
    use jarvis_core::llm::scripted::ScriptedProvider;
    use jarvis_types::config::JarvisConfig;
    use jarvis_types::error::{INITIALIZATION_DETAIL, PROCESSING_DETAIL, UNAVAILABLE_DETAIL};

    /// Serve the router on an ephemeral port and return its base URL.
    async fn spawn_app(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn state_with(script: Option<&ScriptedProvider>) -> AppState {
        AppState::new(
            JarvisConfig::default(),
            script.map(|s| BoxLlmProvider::new(s.clone())),
            PathBuf::from("."),
        )
    }

    #[tokio::test]
    async fn test_chat_returns_reply_and_label() {
        let script = ScriptedProvider::new("gemini-2.5-flash");
        script.push_reply("Compound interest is ...");
        let base = spawn_app(state_with(Some(&script))).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .json(&json!({"user_id": "u1", "message": "What is compound interest?"}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "response": "Compound interest is ...",
                "source_model": JarvisConfig::default().source_model,
            })
        );
    }

    #[tokio::test]
    async fn test_chat_without_provider_is_503() {
        let state = state_with(None);
        let store = state.store.clone();
        let base = spawn_app(state).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .json(&json!({"user_id": "u1", "message": "hi"}))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 503);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"detail": UNAVAILABLE_DETAIL}));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_same_user_reuses_context() {
        let script = ScriptedProvider::new("m");
        let state = state_with(Some(&script));
        let store = state.store.clone();
        let base = spawn_app(state).await;
        let client = reqwest::Client::new();

        for message in ["first", "second"] {
            let resp = client
                .post(format!("{base}/chat"))
                .json(&json!({"user_id": "u1", "message": message}))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200);
        }

        assert_eq!(store.len(), 1);
        assert_eq!(script.open_calls(), 1);
        let lens: Vec<usize> = script.requests().iter().map(|r| r.messages.len()).collect();
        assert_eq!(lens, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_provider_failures_are_500_with_fixed_detail() {
        let script = ScriptedProvider::new("m");
        script.set_fail_open(true);
        let state = state_with(Some(&script));
        let store = state.store.clone();
        let base = spawn_app(state).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{base}/chat"))
            .json(&json!({"user_id": "u1", "message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["detail"], INITIALIZATION_DETAIL);
        assert!(!store.contains("u1"));

        script.set_fail_open(false);
        script.set_fail_complete(true);
        let resp = client
            .post(format!("{base}/chat"))
            .json(&json!({"user_id": "u1", "message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["detail"], PROCESSING_DETAIL);
        assert!(store.contains("u1"));
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_422_with_detail() {
        let script = ScriptedProvider::new("m");
        let base = spawn_app(state_with(Some(&script))).await;
        let client = reqwest::Client::new();

        let missing_field = client
            .post(format!("{base}/chat"))
            .json(&json!({"user_id": "u1"}))
            .send()
            .await
            .unwrap();
        assert_eq!(missing_field.status(), 422);
        let body: Value = missing_field.json().await.unwrap();
        assert!(body["detail"].as_str().is_some_and(|d| !d.is_empty()));

        let bad_json = client
            .post(format!("{base}/chat"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(bad_json.status(), 422);
        let body: Value = bad_json.json().await.unwrap();
        assert!(body.get("detail").is_some());

        assert!(script.requests().is_empty());
    }

    #[tokio::test]
    async fn test_root_is_static_ok() {
        let base = spawn_app(state_with(None)).await;

        let body: Value = reqwest::get(format!("{base}/")).await.unwrap().json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], handlers::health::READY_MESSAGE);
    }

    #[tokio::test]
    async fn test_health_reports_provider_and_sessions() {
        let script = ScriptedProvider::new("gemini-2.5-flash");
        let state = state_with(Some(&script));
        state.router.handle("u1", "hi").await.unwrap();
        let base = spawn_app(state).await;

        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider_ready"], true);
        assert_eq!(body["model"], "gemini-2.5-flash");
        assert_eq!(body["active_sessions"], 1);

        let degraded = spawn_app(state_with(None)).await;
        let body: Value = reqwest::get(format!("{degraded}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["model"], Value::Null);
    }
}
