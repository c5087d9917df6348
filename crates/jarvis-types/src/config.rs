//! Configuration types for the Jarvis backend.
//!
//! `JarvisConfig` mirrors `config.toml` in the data directory. Every field
//! has a default so an empty or missing file yields a working server.

use serde::{Deserialize, Serialize};

/// Default Gemini model used for new conversation contexts.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Name of the secret holding the provider credential.
pub const API_KEY_SECRET: &str = "GEMINI_API_KEY";

/// Top-level backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JarvisConfig {
    /// Provider model identifier every context is bound to.
    #[serde(default = "default_model")]
    pub model: String,

    /// Fixed label returned as `source_model` in every reply.
    #[serde(default = "default_source_model")]
    pub source_model: String,

    /// System instruction applied once when a context is created.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Override for the provider API base URL (proxies, tests).
    #[serde(default)]
    pub provider_base_url: Option<String>,

    /// Timeout for a single provider HTTP call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Session table lifecycle policy.
    #[serde(default)]
    pub sessions: SessionPolicy,
}

/// Lifecycle bounds for the in-memory session table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Contexts idle for longer than this are evicted. `0` disables expiry.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// Upper bound on live contexts. `0` means unbounded.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// How often the background sweeper looks for idle contexts.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_source_model() -> String {
    "Gemini-2.5-Flash (Financial Specialist)".to_string()
}

fn default_system_instruction() -> String {
    "You are an assistant specialized in personal finance and investments, \
     focused on providing analyses, budgeting tips, and explanations of \
     financial terms and strategies. Keep a professional and informative tone."
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_idle_ttl_secs() -> u64 {
    60 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for JarvisConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            source_model: default_source_model(),
            system_instruction: default_system_instruction(),
            provider_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            sessions: SessionPolicy::default(),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = JarvisConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.system_instruction.contains("finance"));
        assert_eq!(config.sessions.idle_ttl_secs, 3600);
        assert_eq!(config.sessions.max_sessions, 10_000);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: JarvisConfig = toml::from_str("").unwrap();
        assert_eq!(config, JarvisConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml_str = r#"
model = "gemini-2.5-pro"
source_model = "Pro"

[sessions]
max_sessions = 5
"#;
        let config: JarvisConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.source_model, "Pro");
        assert_eq!(config.sessions.max_sessions, 5);
        assert_eq!(config.sessions.idle_ttl_secs, 3600);
        assert_eq!(config.request_timeout_secs, 120);
    }
}
