//! Wire entities for the client <-> backend chat protocol.

use serde::{Deserialize, Serialize};

/// Request body for `POST /chat`.
///
/// `user_id` is an opaque, client-generated token. It is only ever used as a
/// session table key and is never validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user_id: String,
    pub message: String,
}

/// Successful response body for `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Provider text, returned verbatim.
    pub response: String,
    /// Fixed label describing the model behind the assistant.
    pub source_model: String,
}

/// Error body returned with every non-200 status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Role of a line in the client-side transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    User,
    Assistant,
}

/// A single line of the visible transcript kept by the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TranscriptRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_field_names() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"user_id":"u1","message":"What is compound interest?"}"#)
                .unwrap();
        assert_eq!(msg.user_id, "u1");
        assert_eq!(msg.message, "What is compound interest?");
    }

    #[test]
    fn test_chat_message_missing_field_rejected() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"user_id":"u1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_reply_serializes_wire_shape() {
        let reply = ChatReply {
            response: "Compound interest is ...".to_string(),
            source_model: "Gemini".to_string(),
        };
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"response": "Compound interest is ...", "source_model": "Gemini"})
        );
    }

    #[test]
    fn test_transcript_role_lowercase() {
        let entry = TranscriptEntry::assistant("hi");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
    }
}
