//! Readiness and health probes.
//!
//! GET /       - static readiness payload
//! GET /health - provider and session table status

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

pub const READY_MESSAGE: &str = "J.A.R.V.I.S. financial assistant is ready. Send messages to POST /chat.";

#[derive(Debug, Serialize)]
pub struct Ready {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `"ok"` when a provider client is available, `"degraded"` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub provider_ready: bool,
    pub model: Option<String>,
    pub active_sessions: usize,
}

/// GET / - always ok, no side effects.
pub async fn root() -> Json<Ready> {
    Json(Ready {
        status: "ok",
        message: READY_MESSAGE,
    })
}

/// GET /health - read-only view of the backend.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let provider_ready = state.router.is_available();
    Json(HealthReport {
        status: if provider_ready { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        provider_ready,
        model: state.router.model().map(str::to_string),
        active_sessions: state.store.len(),
    })
}
