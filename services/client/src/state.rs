//! services/client/src/state.rs
//!
//! Defines the client's shared state, created once at startup and handed to every view.

use crate::adapters::{FileStore, HttpBackend};
use crate::config::Config;
use crate::error::ClientError;
use crate::events::EventBus;
use crate::session::SessionManager;
use scroll_saga_core::endpoints::ApiBase;
use scroll_saga_core::ports::{KeyValueStore, NovelBackend, PortResult};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ClientState {
    pub backend: Arc<dyn NovelBackend>,
    pub session: Arc<SessionManager>,
    pub events: EventBus,
    pub base: ApiBase,
    pub config: Arc<Config>,
}

impl ClientState {
    /// Wires the HTTP backend and the durable session file described by `config`.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let backend = Arc::new(HttpBackend::from_config(&config)?);
        let store = Arc::new(FileStore::new(config.session_path.clone()));
        info!(
            base_url = %backend.base().as_str(),
            session_path = %store.path().display(),
            "Client state initialized"
        );
        Ok(Self::with_parts(backend, store, config)?)
    }

    /// Builds the state around any backend and store, e.g. fakes in tests.
    pub fn with_parts(
        backend: Arc<dyn NovelBackend>,
        store: Arc<dyn KeyValueStore>,
        config: Config,
    ) -> PortResult<Self> {
        let events = EventBus::default();
        let session = Arc::new(SessionManager::new(store, events.clone())?);
        Ok(Self {
            backend,
            session,
            events,
            base: ApiBase::new(&config.api_base_url),
            config: Arc::new(config),
        })
    }
}
