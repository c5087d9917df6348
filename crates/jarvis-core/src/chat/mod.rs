//! Per-user conversation routing.
//!
//! - `ConversationContext`: one user's dialogue with the provider
//! - `SessionStore` / `InMemorySessionStore`: user identifier -> context
//! - `SessionRouter`: the lookup/create/forward lifecycle for one message

pub mod context;
pub mod router;
pub mod store;
