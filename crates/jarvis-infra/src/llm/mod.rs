//! LLM provider implementations.
//!
//! Also provides the startup factory ([`init_provider`]) that resolves the
//! credential and builds the provider once. A missing or unusable
//! credential yields `None`: the backend then serves every chat request with
//! "unavailable" instead of refusing to start.

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use jarvis_core::llm::box_provider::BoxLlmProvider;
use jarvis_core::secret::service::SecretService;
use jarvis_types::config::{API_KEY_SECRET, JarvisConfig};
use jarvis_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from configuration and a resolved API key.
///
/// # Errors
///
/// Returns [`LlmError::AuthenticationFailed`] if no key is provided, or a
/// provider error if the HTTP client cannot be created.
pub fn create_provider(
    config: &JarvisConfig,
    api_key: Option<&str>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or(LlmError::AuthenticationFailed)?;

    let mut provider = GeminiProvider::new(
        SecretString::from(key.to_string()),
        config.model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )?;
    if let Some(base_url) = config.provider_base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }
    Ok(BoxLlmProvider::new(provider))
}

/// Resolve the provider credential and build the provider, once, at startup.
///
/// Never fails: every problem is logged and degrades to `None`.
pub async fn init_provider(config: &JarvisConfig, secrets: &SecretService) -> Option<BoxLlmProvider> {
    let api_key = match secrets.get_secret(API_KEY_SECRET).await {
        Ok(Some(key)) => key,
        Ok(None) => {
            tracing::warn!(
                secret = API_KEY_SECRET,
                "provider credential not found; the AI service will be unavailable"
            );
            return None;
        }
        Err(e) => {
            tracing::error!(secret = API_KEY_SECRET, error = %e, "failed to resolve provider credential");
            return None;
        }
    };

    match create_provider(config, Some(&api_key)) {
        Ok(provider) => {
            tracing::info!(provider = provider.name(), model = provider.model(), "LLM provider client initialized");
            Some(provider)
        }
        Err(e) => {
            tracing::error!(error = %e, "could not initialize the LLM provider client");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use jarvis_core::secret::SecretProvider;
    use jarvis_types::error::SecretError;

    struct Fixed(Option<&'static str>);

    impl SecretProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, SecretError> {
            Ok(self.0.map(str::to_string))
        }
    }

    #[test]
    fn test_create_provider_gemini() {
        let provider = create_provider(&JarvisConfig::default(), Some("k")).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_create_provider_missing_key() {
        let result = create_provider(&JarvisConfig::default(), None);
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
        let result = create_provider(&JarvisConfig::default(), Some("   "));
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_init_provider_without_secret_is_none() {
        let secrets = SecretService::new(vec![Arc::new(Fixed(None))]);
        assert!(init_provider(&JarvisConfig::default(), &secrets).await.is_none());
    }

    #[tokio::test]
    async fn test_init_provider_with_secret() {
        let secrets = SecretService::new(vec![Arc::new(Fixed(Some("key")))]);
        let config = JarvisConfig {
            model: "gemini-2.5-pro".to_string(),
            ..JarvisConfig::default()
        };
        let provider = init_provider(&config, &secrets).await.unwrap();
        assert_eq!(provider.model(), "gemini-2.5-pro");
    }
}
