use thiserror::Error;

use crate::llm::LlmError;

/// Public detail returned with HTTP 503.
pub const UNAVAILABLE_DETAIL: &str =
    "AI service unavailable. Check your API key or connection.";

/// Public detail returned with HTTP 500 when a session could not be started.
pub const INITIALIZATION_DETAIL: &str = "Internal error while starting the AI session.";

/// Public detail returned with HTTP 500 when forwarding a message failed.
pub const PROCESSING_DETAIL: &str =
    "Internal error while processing the request with the AI model.";

/// Errors produced by the session router.
///
/// The `Display` output includes the provider cause and is meant for logs.
/// Clients only ever see [`RouterError::detail`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// No provider client was initialized at startup.
    #[error("provider client not initialized")]
    Unavailable,

    /// Creating the conversation context for a new user failed.
    #[error("failed to create conversation context: {0}")]
    Initialization(#[source] LlmError),

    /// Forwarding a message through an existing context failed.
    #[error("failed to process message: {0}")]
    Processing(#[source] LlmError),
}

impl RouterError {
    /// Human-readable detail safe to return to clients.
    pub fn detail(&self) -> &'static str {
        match self {
            RouterError::Unavailable => UNAVAILABLE_DETAIL,
            RouterError::Initialization(_) => INITIALIZATION_DETAIL,
            RouterError::Processing(_) => PROCESSING_DETAIL,
        }
    }
}

/// Errors related to secret resolution.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret provider unavailable")]
    ProviderUnavailable,

    #[error("secret '{key}' is not valid UTF-8")]
    InvalidEncoding { key: String },

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Transport-level failures seen by the chat client.
///
/// Each variant renders to a distinct transcript message; none of them ever
/// terminates the chat loop.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to the backend at {url}")]
    Connection { url: String },

    #[error("no reply from the backend within {secs}s")]
    Timeout { secs: u64 },

    #[error("backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}
