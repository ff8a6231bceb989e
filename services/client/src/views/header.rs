//! The navigation header: who is signed in, and their photo.

use crate::events::ClientEvent;
use crate::state::ClientState;
use crate::views::until_cancelled;
use scroll_saga_core::domain::Session;
use scroll_saga_core::ports::{PortError, PortResult};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderModel {
    pub logged_in: bool,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Clone)]
pub struct NavigationHeader {
    state: ClientState,
    model: Arc<RwLock<HeaderModel>>,
}

impl NavigationHeader {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            model: Arc::new(RwLock::new(HeaderModel::default())),
        }
    }

    pub async fn snapshot(&self) -> HeaderModel {
        self.model.read().await.clone()
    }

    /// Called on every route change: re-reads the stored session, then refreshes.
    pub async fn navigate(&self, cancel: &CancellationToken) -> PortResult<HeaderModel> {
        let session = self.state.session.revalidate()?;
        self.refresh_from(session, cancel).await
    }

    pub async fn refresh(&self, cancel: &CancellationToken) -> PortResult<HeaderModel> {
        let session = self.state.session.current();
        self.refresh_from(session, cancel).await
    }

    async fn refresh_from(
        &self,
        session: Option<Session>,
        cancel: &CancellationToken,
    ) -> PortResult<HeaderModel> {
        let Some(session) = session else {
            let mut model = self.model.write().await;
            *model = HeaderModel::default();
            return Ok(model.clone());
        };

        let photo_url = match until_cancelled(cancel, self.state.backend.own_profile(&session)).await
        {
            Ok(profile) => self
                .state
                .base
                .profile_photo_url(profile.profile_photo.as_deref()),
            Err(PortError::Cancelled) => return Err(PortError::Cancelled),
            Err(e) => {
                // The header still shows the username without a photo.
                debug!(error = %e, "Header could not load the profile photo");
                None
            }
        };

        let mut model = self.model.write().await;
        *model = HeaderModel {
            logged_in: true,
            username: Some(session.username),
            photo_url,
        };
        Ok(model.clone())
    }

    /// Keeps the header current until `cancel` fires. Subscribes before
    /// spawning so no event published after this call is missed.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let mut events = self.state.events.subscribe();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(ClientEvent::SessionChanged(_)) | Ok(ClientEvent::ProfileUpdated { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Header fell behind on client events");
                    }
                    Err(RecvError::Closed) => break,
                }
                if let Err(PortError::Cancelled) = self.refresh(&cancel).await {
                    break;
                }
            }
            info!("Navigation header stopped listening");
        })
    }
}
