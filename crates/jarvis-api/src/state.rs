//! Application state wiring the backend together.
//!
//! AppState pins the generic [`SessionRouter`] to the in-memory session
//! store and holds the configuration it was built from. Cloned into every
//! axum handler.

use std::path::PathBuf;
use std::sync::Arc;

use jarvis_core::chat::router::SessionRouter;
use jarvis_core::chat::store::InMemorySessionStore;
use jarvis_core::llm::box_provider::BoxLlmProvider;
use jarvis_infra::config::{load_config, resolve_data_dir};
use jarvis_infra::llm::init_provider;
use jarvis_infra::secret::chain::default_secret_service;
use jarvis_types::config::JarvisConfig;

pub type ConcreteSessionRouter = SessionRouter<InMemorySessionStore>;

/// Shared backend state.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ConcreteSessionRouter>,
    pub store: Arc<InMemorySessionStore>,
    pub config: Arc<JarvisConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Resolve configuration and the provider credential, then wire the
    /// router. A missing credential is not an error: the router is built
    /// without a provider and answers every chat with "unavailable".
    pub async fn init() -> Self {
        let data_dir = resolve_data_dir();
        let config = load_config(&data_dir);

        let secrets = default_secret_service(&data_dir);
        let provider = init_provider(&config, &secrets).await;

        Self::new(config, provider, data_dir)
    }

    pub fn new(config: JarvisConfig, provider: Option<BoxLlmProvider>, data_dir: PathBuf) -> Self {
        let store = Arc::new(InMemorySessionStore::new(config.sessions.clone()));
        let router = SessionRouter::new(
            provider,
            Arc::clone(&store),
            config.system_instruction.clone(),
            config.source_model.clone(),
        );

        Self {
            router: Arc::new(router),
            store,
            config: Arc::new(config),
            data_dir,
        }
    }
}
