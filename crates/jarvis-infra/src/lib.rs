//! Infrastructure layer for Jarvis.
//!
//! Contains implementations of the ports defined in `jarvis-core`: the
//! Google Gemini LLM provider, environment and file secret providers, and
//! the configuration loader.

pub mod config;
pub mod llm;
pub mod secret;
