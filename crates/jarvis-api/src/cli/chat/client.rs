//! HTTP client for the backend chat endpoint.
//!
//! Every failure is classified into a [`ClientError`] kind; the chat loop
//! renders it as an assistant line with [`render_error`] so the transcript
//! always gets an answer for each user message.

use std::time::Duration;

use serde_json::Value;

use jarvis_types::chat::{ChatMessage, ErrorBody};
use jarvis_types::error::ClientError;

/// Shown when the backend answers 200 without usable text.
pub const EMPTY_REPLY: &str = "The assistant returned an empty response.";

pub struct ChatClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unexpected(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one message and return the assistant's text.
    pub async fn send(&self, user_id: &str, message: &str) -> Result<String, ClientError> {
        let body = ChatMessage {
            user_id: user_id.to_string(),
            message: message.to_string(),
        };

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.detail)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let value: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error()
            } else {
                ClientError::Unexpected(format!("malformed response body: {e}"))
            }
        })?;

        match value.get("response").and_then(Value::as_str) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Ok(EMPTY_REPLY.to_string()),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ClientError {
        if e.is_timeout() {
            self.timeout_error()
        } else if e.is_connect() {
            ClientError::Connection {
                url: self.url.clone(),
            }
        } else {
            ClientError::Unexpected(e.to_string())
        }
    }

    fn timeout_error(&self) -> ClientError {
        ClientError::Timeout {
            secs: self.timeout.as_secs(),
        }
    }
}

/// Text of the assistant line shown for a failed exchange.
pub fn render_error(err: &ClientError) -> String {
    match err {
        ClientError::Connection { url } => format!(
            "Connection error: make sure the Jarvis backend (`jarvis serve`) is running at {url}"
        ),
        ClientError::Timeout { secs } => format!(
            "Timeout: the backend did not answer within {secs}s. Please try again."
        ),
        ClientError::Status { detail, .. } => {
            format!("Error communicating with the API: {detail}")
        }
        ClientError::Unexpected(msg) => format!("Unexpected error: {msg}"),
    }
}
