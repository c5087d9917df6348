//! Shared types for the Jarvis chat relay.
//!
//! Wire entities exchanged between the chat client and the backend, LLM
//! request/response shapes, configuration, and the error enums every other
//! crate propagates.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
