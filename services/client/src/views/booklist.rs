//! The signed-in user's saved novels: the save toggle shown on cards and the
//! book list page itself.

use crate::state::ClientState;
use crate::views::{until_cancelled, ViewStatus};
use scroll_saga_core::domain::{Novel, NovelId};
use scroll_saga_core::messages::{user_message, BOOKLIST_AUTH_REQUIRED};
use scroll_saga_core::ports::{PortError, PortResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SAVED_DEFAULT: &str = "Saved to book list.";
const REMOVED_DEFAULT: &str = "Removed from book list.";
const TOGGLE_FALLBACK: &str = "Unable to update your book list. Please refresh and try again.";
const BOOKLIST_FALLBACK: &str = "Unable to load your book list. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct SavedModel {
    pub saved: HashSet<NovelId>,
    pub in_flight: HashSet<NovelId>,
    pub status: ViewStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Saved,
    Removed,
    /// A toggle for the same novel was still running; nothing was sent.
    AlreadyInFlight,
}

/// Which novels the current user has saved, kept in step with the server.
#[derive(Clone)]
pub struct SavedNovels {
    state: ClientState,
    model: Arc<RwLock<SavedModel>>,
}

impl SavedNovels {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            model: Arc::new(RwLock::new(SavedModel::default())),
        }
    }

    pub async fn snapshot(&self) -> SavedModel {
        self.model.read().await.clone()
    }

    pub async fn is_saved(&self, novel_id: NovelId) -> bool {
        self.model.read().await.saved.contains(&novel_id)
    }

    /// Seeds the saved set from the server. Logged-out users get an empty set
    /// and no request is made.
    pub async fn bootstrap(&self, cancel: &CancellationToken) -> PortResult<usize> {
        let Some(session) = self.state.session.current() else {
            self.model.write().await.saved.clear();
            return Ok(0);
        };
        match until_cancelled(cancel, self.state.backend.booklist(&session)).await {
            Ok(novels) => Ok(self.replace(novels.iter().map(|novel| novel.id)).await),
            Err(e) => {
                // Cards still render without the saved markers.
                debug!(error = %e, "Could not bootstrap saved novels");
                Err(e)
            }
        }
    }

    pub(crate) async fn replace(&self, ids: impl Iterator<Item = NovelId>) -> usize {
        let mut model = self.model.write().await;
        model.saved = ids.collect();
        model.saved.len()
    }

    /// Saves or unsaves `novel_id` depending on its current state. The saved set
    /// only changes once the server has confirmed.
    pub async fn toggle(
        &self,
        novel_id: NovelId,
        cancel: &CancellationToken,
    ) -> PortResult<ToggleOutcome> {
        let session = match self.state.session.require() {
            Ok(session) => session,
            Err(e) => return Err(self.model.write().await.status.reject(e)),
        };

        let was_saved = {
            let mut model = self.model.write().await;
            if !model.in_flight.insert(novel_id) {
                return Ok(ToggleOutcome::AlreadyInFlight);
            }
            model.status.begin();
            model.saved.contains(&novel_id)
        };

        let backend = &self.state.backend;
        let result = if was_saved {
            until_cancelled(cancel, backend.unsave_novel(&session, novel_id)).await
        } else {
            until_cancelled(cancel, backend.save_novel(&session, novel_id)).await
        };
        let mut model = self.model.write().await;
        model.in_flight.remove(&novel_id);
        if matches!(result, Err(PortError::Cancelled)) {
            model.status.abandon();
            return Err(PortError::Cancelled);
        }
        match result {
            Ok(message) => {
                let (outcome, default) = if was_saved {
                    model.saved.remove(&novel_id);
                    (ToggleOutcome::Removed, REMOVED_DEFAULT)
                } else {
                    model.saved.insert(novel_id);
                    (ToggleOutcome::Saved, SAVED_DEFAULT)
                };
                model
                    .status
                    .succeed(Some(message.unwrap_or_else(|| default.to_string())));
                info!(novel_id, ?outcome, "Book list updated");
                Ok(outcome)
            }
            Err(e) => {
                warn!(novel_id, error = %e, "Book list update failed");
                let message = if e.is_unauthorized() {
                    BOOKLIST_AUTH_REQUIRED.to_string()
                } else {
                    user_message(&e, TOGGLE_FALLBACK)
                };
                model.status.fail(message);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookListModel {
    pub novels: Vec<Novel>,
    pub status: ViewStatus,
}

/// The book list page.
#[derive(Clone)]
pub struct BookListView {
    state: ClientState,
    saved: SavedNovels,
    model: Arc<RwLock<BookListModel>>,
}

impl BookListView {
    pub fn new(state: ClientState) -> Self {
        Self {
            saved: SavedNovels::new(state.clone()),
            state,
            model: Arc::new(RwLock::new(BookListModel::default())),
        }
    }

    pub fn saved(&self) -> &SavedNovels {
        &self.saved
    }

    pub async fn snapshot(&self) -> BookListModel {
        self.model.read().await.clone()
    }

    pub async fn load(&self, cancel: &CancellationToken) -> PortResult<usize> {
        let session = match self.state.session.require() {
            Ok(session) => session,
            Err(e) => return Err(self.model.write().await.status.reject(e)),
        };
        self.model.write().await.status.begin();

        let novels = match until_cancelled(cancel, self.state.backend.booklist(&session)).await {
            Ok(novels) => novels,
            Err(PortError::Cancelled) => {
                self.model.write().await.status.abandon();
                return Err(PortError::Cancelled);
            }
            Err(e) => {
                let message = if e.is_unauthorized() {
                    BOOKLIST_AUTH_REQUIRED.to_string()
                } else {
                    user_message(&e, BOOKLIST_FALLBACK)
                };
                self.model.write().await.status.fail(message);
                return Err(e);
            }
        };

        self.saved.replace(novels.iter().map(|novel| novel.id)).await;
        let mut model = self.model.write().await;
        model.novels = novels;
        model.status.succeed(None);
        Ok(model.novels.len())
    }

    /// Unsaves (or re-saves) a novel from the list page. A removed novel leaves
    /// the list only after the server confirmed the removal.
    pub async fn toggle(
        &self,
        novel_id: NovelId,
        cancel: &CancellationToken,
    ) -> PortResult<ToggleOutcome> {
        let outcome = self.saved.toggle(novel_id, cancel).await?;
        if outcome == ToggleOutcome::Removed {
            self.model
                .write()
                .await
                .novels
                .retain(|novel| novel.id != novel_id);
        }
        Ok(outcome)
    }
}
