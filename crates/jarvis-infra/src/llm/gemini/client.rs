//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! Sends requests to the Gemini REST API (`models/{model}:generateContent`)
//! with the API key in the `x-goog-api-key` header. Gemini chat sessions are
//! client-side: every call carries the system instruction and the full
//! history, so opening a session only has to confirm that the model is
//! reachable with the configured credential.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;

use jarvis_core::llm::provider::LlmProvider;
use jarvis_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, ModelInfo,
};

/// Google Gemini LLM provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    /// Model metadata from the first successful `open_session`.
    model_info: OnceCell<ModelInfo>,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    /// Create a new Gemini provider.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Provider`] if the HTTP client cannot be built
    /// (e.g. TLS backend initialization failure).
    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model,
            model_info: OnceCell::new(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model metadata, available once a session has been opened.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.get()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Convert a generic [`CompletionRequest`] into a Gemini request body.
    fn to_gemini_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                GeminiContent::text(Some(role), &m.content)
            })
            .collect();

        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        GenerateContentRequest {
            system_instruction: request
                .system
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| GeminiContent::text(None, s)),
            contents,
            generation_config,
        }
    }

    async fn fetch_model_info(&self) -> Result<ModelInfo, LlmError> {
        let url = self.url(&format!("models/{}", self.model));
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.error_from_response(response).await);
        }

        response
            .json::<ModelInfo>()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse model info: {e}")))
    }

    /// Map a non-2xx response to an [`LlmError`].
    async fn error_from_response(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<GeminiErrorEnvelope>(&body).ok();
        let message = parsed
            .as_ref()
            .map(|e| e.error.message.clone())
            .unwrap_or_else(|| body.clone());

        let key_invalid = parsed
            .as_ref()
            .is_some_and(|e| e.error.reasons().any(|r| r == "API_KEY_INVALID"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationFailed,
            StatusCode::BAD_REQUEST if key_invalid => LlmError::AuthenticationFailed,
            StatusCode::BAD_REQUEST => LlmError::InvalidRequest(message),
            StatusCode::NOT_FOUND => LlmError::ModelNotFound(self.model.clone()),
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { retry_after_ms },
            _ => LlmError::Provider {
                message: format!("HTTP {status}: {message}"),
            },
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn open_session(&self, _system_instruction: &str) -> Result<(), LlmError> {
        let info = self
            .model_info
            .get_or_try_init(|| self.fetch_model_info())
            .await?;
        tracing::trace!(model = %info.name, "gemini model verified");
        Ok(())
    }

    #[tracing::instrument(
        name = "gemini.generate_content",
        skip_all,
        fields(
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = "gemini",
            gen_ai.request.model = %self.model,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        )
    )]
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let url = self.url(&format!("models/{model}:generateContent"));
        let body = self.to_gemini_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        let gemini_resp: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let Some(candidate) = gemini_resp.candidates.first() else {
            let reason = gemini_resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LlmError::Blocked(reason));
        };

        let content = candidate
            .content
            .as_ref()
            .map(GeminiContent::joined_text)
            .unwrap_or_default();

        let stop_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
                StopReason::Safety
            }
            Some(_) => StopReason::Other,
        };

        if content.is_empty() && stop_reason == StopReason::Safety {
            return Err(LlmError::Blocked(
                candidate.finish_reason.clone().unwrap_or_default(),
            ));
        }

        let usage = gemini_resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let span = tracing::Span::current();
        span.record("gen_ai.usage.input_tokens", usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", usage.output_tokens);

        Ok(CompletionResponse {
            content,
            model: gemini_resp.model_version.unwrap_or_else(|| model.to_string()),
            stop_reason,
            usage,
        })
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_connect() || e.is_timeout() {
        LlmError::Unreachable(e.to_string())
    } else {
        LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        }
    }
}
