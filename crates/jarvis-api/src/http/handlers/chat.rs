//! Chat endpoint.
//!
//! POST /chat

use axum::Json;
use axum::extract::State;

use jarvis_types::chat::{ChatMessage, ChatReply};

use crate::http::error::AppError;
use crate::http::extractors::json::ApiJson;
use crate::state::AppState;

/// POST /chat - process one message in the sender's conversation.
///
/// 200 with `{response, source_model}`; 503 when no provider client was
/// initialized; 500 when the context could not be created or the provider
/// call failed.
pub async fn chat(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChatMessage>,
) -> Result<Json<ChatReply>, AppError> {
    let reply = state.router.handle(&body.user_id, &body.message).await?;
    Ok(Json(reply))
}
