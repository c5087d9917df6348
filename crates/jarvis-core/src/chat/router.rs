//! Session router: the request lifecycle behind `POST /chat`.
//!
//! Given a user identifier and a message, guarantees the message is
//! processed inside that user's continuing conversation context, creating
//! the context on first contact. The router manages context identity only;
//! history belongs to the context.

use std::sync::Arc;

use jarvis_types::chat::ChatReply;
use jarvis_types::error::RouterError;

use crate::llm::box_provider::BoxLlmProvider;

use super::context::ConversationContext;
use super::store::SessionStore;

/// Routes messages to per-user conversation contexts.
pub struct SessionRouter<S: SessionStore> {
    /// `None` when the provider client could not be initialized at startup.
    provider: Option<Arc<BoxLlmProvider>>,
    store: Arc<S>,
    system_instruction: String,
    source_model: String,
}

impl<S: SessionStore> SessionRouter<S> {
    pub fn new(
        provider: Option<BoxLlmProvider>,
        store: Arc<S>,
        system_instruction: impl Into<String>,
        source_model: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.map(Arc::new),
            store,
            system_instruction: system_instruction.into(),
            source_model: source_model.into(),
        }
    }

    /// Whether a provider client is available to serve requests.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Model new contexts are bound to, if a provider is configured.
    pub fn model(&self) -> Option<&str> {
        self.provider.as_deref().map(BoxLlmProvider::model)
    }

    pub fn source_model(&self) -> &str {
        &self.source_model
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Process one message for `user_id`.
    ///
    /// 1. Fails fast with [`RouterError::Unavailable`] when no provider was
    ///    initialized; the session table is not consulted.
    /// 2. Looks up or creates the user's context. Creation failures map to
    ///    [`RouterError::Initialization`] and leave no entry behind.
    /// 3. Forwards the message; failures map to [`RouterError::Processing`]
    ///    and the context stays in the table.
    #[tracing::instrument(name = "chat", skip(self, message), fields(message_len = message.len()))]
    pub async fn handle(&self, user_id: &str, message: &str) -> Result<ChatReply, RouterError> {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("provider client not initialized; rejecting request");
            return Err(RouterError::Unavailable);
        };

        let handle = self
            .store
            .get_or_create(user_id, || {
                ConversationContext::open(
                    user_id.to_string(),
                    Arc::clone(provider),
                    self.system_instruction.clone(),
                )
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to create conversation context");
                RouterError::Initialization(e)
            })?;

        let context = handle.context;
        if handle.created {
            tracing::info!(context_id = %context.id(), model = %context.model(), "new conversation context created");
        }

        let response = context.send_message(message).await.map_err(|e| {
            tracing::error!(context_id = %context.id(), error = %e, "provider call failed");
            RouterError::Processing(e)
        })?;

        Ok(ChatReply {
            response,
            source_model: self.source_model.clone(),
        })
    }
}
