//! Environment variable secret provider.
//!
//! A read-only provider that checks environment variables. It is the
//! highest-priority provider in the resolution chain. Values from a `.env`
//! file are visible here once `config::load_dotenv` has run.

use jarvis_core::secret::SecretProvider;
use jarvis_types::error::SecretError;

/// Environment variable secret provider.
pub struct EnvSecretProvider {
    prefix: Option<String>,
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Check `{prefix}{key}` before `key` (e.g. `JARVIS_GEMINI_API_KEY`).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn read(name: &str) -> Result<Option<String>, SecretError> {
        match std::env::var(name) {
            Ok(val) => Ok(Some(val)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::InvalidEncoding {
                key: name.to_string(),
            }),
        }
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretProvider for EnvSecretProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        if let Some(prefix) = &self.prefix {
            if let Some(val) = Self::read(&format!("{prefix}{key}"))? {
                return Ok(Some(val));
            }
        }
        Self::read(key)
    }
}
