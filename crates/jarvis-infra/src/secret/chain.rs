//! Secret chain builder -- wires concrete providers in priority order.
//!
//! Lives in `jarvis-infra` because it assembles concrete implementations.
//! The resulting chain is handed to `SecretService` in `jarvis-core`.
//!
//! Default chain order: `[EnvSecretProvider, FileSecretProvider]`

use std::path::Path;
use std::sync::Arc;

use jarvis_core::secret::DynSecretProvider;
use jarvis_core::secret::service::SecretService;

use super::env::EnvSecretProvider;
use super::file::FileSecretProvider;

/// Build the default secret resolution chain.
///
/// 1. Environment variables (`JARVIS_{KEY}`, then `{KEY}`)
/// 2. Secret files under `{data_dir}/secrets/`
pub fn build_secret_chain(data_dir: &Path) -> Vec<DynSecretProvider> {
    vec![
        Arc::new(EnvSecretProvider::with_prefix("JARVIS_")),
        Arc::new(FileSecretProvider::new(data_dir.join("secrets"))),
    ]
}

/// Convenience: a [`SecretService`] over the default chain.
pub fn default_secret_service(data_dir: &Path) -> SecretService {
    SecretService::new(build_secret_chain(data_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_chain_falls_back_to_file() {
        let tmp = TempDir::new().unwrap();
        let secrets_dir = tmp.path().join("secrets");
        tokio::fs::create_dir_all(&secrets_dir).await.unwrap();
        tokio::fs::write(secrets_dir.join("JARVIS_CHAIN_TEST_KEY"), "from-file\n")
            .await
            .unwrap();

        let service = default_secret_service(tmp.path());
        let value = service.get_secret("JARVIS_CHAIN_TEST_KEY").await.unwrap();
        assert_eq!(value.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_chain_order() {
        let tmp = TempDir::new().unwrap();
        let chain = build_secret_chain(tmp.path());
        let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["env", "file"]);
    }
}
