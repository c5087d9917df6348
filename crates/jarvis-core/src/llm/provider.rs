//! LlmProvider trait definition.
//!
//! This is the whole contract the session router needs from a model
//! provider: open a chat session bound to a system instruction, and send the
//! accumulated conversation to receive generated text. Any backend offering
//! those two calls is substitutable.

use jarvis_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Gemini, test doubles, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in jarvis-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier new sessions are bound to.
    fn model(&self) -> &str;

    /// Prepare a new chat session for the given system instruction.
    ///
    /// Called exactly once per conversation context, before it is stored.
    /// An error here means the context is never created.
    fn open_session(
        &self,
        system_instruction: &str,
    ) -> impl std::future::Future<Output = Result<(), LlmError>> + Send;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
