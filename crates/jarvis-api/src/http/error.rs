//! Application error type mapping to HTTP status codes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jarvis_types::chat::ErrorBody;
use jarvis_types::error::RouterError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Failure inside the session router.
    Router(RouterError),
    /// The request body is not a valid chat message.
    Validation(String),
}

impl From<RouterError> for AppError {
    fn from(e: RouterError) -> Self {
        AppError::Router(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Router(RouterError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Router(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Router errors expose only their fixed public text; the cause has
        // already been logged by the router.
        let detail = match self {
            AppError::Router(e) => e.detail().to_string(),
            AppError::Validation(msg) => msg,
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_types::error::{INITIALIZATION_DETAIL, PROCESSING_DETAIL};
    use jarvis_types::llm::LlmError;

    #[test]
    fn test_router_errors_map_to_fixed_statuses() {
        assert_eq!(
            AppError::from(RouterError::Unavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(RouterError::Initialization(LlmError::AuthenticationFailed)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(RouterError::Processing(LlmError::Unreachable("x".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_details_are_fixed_strings() {
        let init = RouterError::Initialization(LlmError::Provider {
            message: "secret upstream text".into(),
        });
        assert_eq!(init.detail(), INITIALIZATION_DETAIL);
        let processing = RouterError::Processing(LlmError::RateLimited { retry_after_ms: None });
        assert_eq!(processing.detail(), PROCESSING_DETAIL);
    }
}
