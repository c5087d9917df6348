//! Secret provider trait definition.
//!
//! Providers are consulted in priority order by [`service::SecretService`];
//! the first one holding a value wins. Implementations live in jarvis-infra.

pub mod service;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use jarvis_types::error::SecretError;

/// Trait for read-only secret backends (environment, secret files).
pub trait SecretProvider: Send + Sync {
    /// Short backend name used in logs (never the secret value).
    fn name(&self) -> &str;

    /// Retrieve a secret value by key.
    /// Returns None if the secret does not exist in this provider.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, SecretError>> + Send;
}

/// Object-safe version of [`SecretProvider`] with boxed futures.
pub trait SecretProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, SecretError>> + Send + 'a>>;
}

impl<T: SecretProvider> SecretProviderDyn for T {
    fn name(&self) -> &str {
        SecretProvider::name(self)
    }

    fn get_boxed<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, SecretError>> + Send + 'a>> {
        Box::pin(self.get(key))
    }
}

/// Shared, type-erased secret provider used in resolution chains.
pub type DynSecretProvider = Arc<dyn SecretProviderDyn>;
