//! Secret resolution service.
//!
//! SecretService resolves secrets through a chain of providers in priority
//! order. This service depends only on the `SecretProviderDyn` abstraction,
//! never on concrete infra implementations.

use jarvis_types::error::SecretError;

use super::DynSecretProvider;

/// Resolves secrets across multiple read-only backends.
///
/// Providers are ordered by precedence (first match wins).
pub struct SecretService {
    providers: Vec<DynSecretProvider>,
}

impl SecretService {
    pub fn new(providers: Vec<DynSecretProvider>) -> Self {
        Self { providers }
    }

    /// Resolve a secret value by iterating through providers in order.
    ///
    /// Blank values are treated as absent so an empty `KEY=` line in an env
    /// file does not mask a lower-priority backend.
    pub async fn get_secret(&self, key: &str) -> Result<Option<String>, SecretError> {
        for provider in &self.providers {
            if let Some(value) = provider.get_boxed(key).await? {
                if value.trim().is_empty() {
                    continue;
                }
                tracing::debug!(key, provider = provider.name(), "secret resolved");
                return Ok(Some(value.trim().to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::secret::SecretProvider;

    struct MapProvider {
        name: &'static str,
        values: HashMap<String, String>,
    }

    impl MapProvider {
        fn new(name: &'static str, pairs: &[(&str, &str)]) -> Self {
            Self {
                name,
                values: pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl SecretProvider for MapProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
            Ok(self.values.get(key).cloned())
        }
    }

    struct FailingProvider;

    impl SecretProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, SecretError> {
            Err(SecretError::ProviderUnavailable)
        }
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let service = SecretService::new(vec![
            Arc::new(MapProvider::new("env", &[("KEY", "from-env")])),
            Arc::new(MapProvider::new("file", &[("KEY", "from-file")])),
        ]);
        assert_eq!(
            service.get_secret("KEY").await.unwrap(),
            Some("from-env".to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_value_falls_through() {
        let service = SecretService::new(vec![
            Arc::new(MapProvider::new("env", &[("KEY", "  ")])),
            Arc::new(MapProvider::new("file", &[("KEY", "from-file\n")])),
        ]);
        assert_eq!(
            service.get_secret("KEY").await.unwrap(),
            Some("from-file".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_everywhere() {
        let service = SecretService::new(vec![Arc::new(MapProvider::new("env", &[]))]);
        assert_eq!(service.get_secret("KEY").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let service = SecretService::new(vec![Arc::new(FailingProvider)]);
        assert!(service.get_secret("KEY").await.is_err());
    }
}
