//! A single user's ongoing conversation with the provider.
//!
//! The context owns the accumulated history. Callers never touch it
//! directly: they only hand a message to [`ConversationContext::send_message`],
//! which sends the full history with the new turn and commits both the user
//! turn and the reply once the provider answers.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use jarvis_types::llm::{CompletionRequest, LlmError, Message};

use crate::llm::box_provider::BoxLlmProvider;

/// One user's conversation context.
///
/// Concurrent `send_message` calls on the same context are serialized by the
/// history lock, which is held for the whole provider round trip.
pub struct ConversationContext {
    id: Uuid,
    user_id: String,
    model: String,
    system_instruction: String,
    provider: Arc<BoxLlmProvider>,
    history: Mutex<Vec<Message>>,
    created_at: DateTime<Utc>,
    /// Unix millis of the last time a message was started or completed.
    last_active_ms: AtomicI64,
    turns: AtomicU32,
}

impl ConversationContext {
    /// Open a new context bound to `provider` and `system_instruction`.
    ///
    /// Asks the provider to open a session first; on failure nothing is
    /// constructed.
    pub async fn open(
        user_id: impl Into<String>,
        provider: Arc<BoxLlmProvider>,
        system_instruction: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let system_instruction = system_instruction.into();
        provider.open_session(&system_instruction).await?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            model: provider.model().to_string(),
            system_instruction,
            provider,
            history: Mutex::new(Vec::new()),
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
            turns: AtomicU32::new(0),
        })
    }

    /// Instance identity; stable for the lifetime of the context.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        let ms = self.last_active_ms.load(Ordering::Acquire);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(self.created_at)
    }

    /// Number of completed user/assistant exchanges.
    pub fn turns(&self) -> u32 {
        self.turns.load(Ordering::Acquire)
    }

    /// True while a message is being forwarded through this context.
    pub fn is_busy(&self) -> bool {
        self.history.try_lock().is_err()
    }

    /// Snapshot of the committed history.
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }

    /// Forward `text` to the provider with the full history and return the
    /// generated reply verbatim.
    ///
    /// History is only extended when the provider call succeeds; a failed
    /// call leaves the committed turns as they were.
    pub async fn send_message(&self, text: &str) -> Result<String, LlmError> {
        let mut history = self.history.lock().await;
        self.touch();

        let mut messages = history.clone();
        messages.push(Message::user(text));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            system: Some(self.system_instruction.clone()),
            max_tokens: None,
            temperature: None,
        };

        let response = self.provider.complete(&request).await?;

        history.push(Message::user(text));
        history.push(Message::assistant(response.content.clone()));
        self.turns.fetch_add(1, Ordering::AcqRel);
        self.touch();

        tracing::debug!(
            context_id = %self.id,
            turns = history.len() / 2,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "provider reply committed"
        );

        Ok(response.content)
    }

    pub(crate) fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, by: chrono::Duration) {
        let ms = self.last_active_ms.load(Ordering::Acquire) - by.num_milliseconds();
        self.last_active_ms.store(ms, Ordering::Release);
    }
}

impl std::fmt::Debug for ConversationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationContext")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("model", &self.model)
            .field("turns", &self.turns())
            .finish_non_exhaustive()
    }
}
