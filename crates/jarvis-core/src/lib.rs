//! Business logic for the Jarvis chat relay.
//!
//! This crate owns the session-routing layer: mapping an opaque user
//! identifier to a long-lived conversation context and forwarding messages
//! through it. It defines the "ports" (provider and secret traits) that
//! `jarvis-infra` implements and never depends on any HTTP or storage crate.

pub mod chat;
pub mod llm;
pub mod secret;
