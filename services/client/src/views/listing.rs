//! The home page: every novel with its stats and cover.

use crate::state::ClientState;
use crate::views::{fetch_stats_batch, until_cancelled, ViewStatus};
use scroll_saga_core::domain::{Novel, NovelId, NovelStats};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::ports::{PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LISTING_FALLBACK: &str = "Unable to load novels. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct ListingModel {
    pub status: ViewStatus,
    pub novels: Vec<Novel>,
    pub stats: HashMap<NovelId, NovelStats>,
}

#[derive(Clone)]
pub struct ListingView {
    state: ClientState,
    model: Arc<RwLock<ListingModel>>,
}

impl ListingView {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            model: Arc::new(RwLock::new(ListingModel::default())),
        }
    }

    pub async fn snapshot(&self) -> ListingModel {
        self.model.read().await.clone()
    }

    /// Absolute cover URL for a listed novel, if it has one.
    pub fn cover_url(&self, novel: &Novel) -> Option<String> {
        self.state.base.cover_url(novel.cover_image.as_deref())
    }

    /// Loads the catalog, then the stats for every listed novel.
    pub async fn load(&self, cancel: &CancellationToken) -> PortResult<usize> {
        self.model.write().await.status.begin();

        let novels = match until_cancelled(cancel, self.state.backend.list_novels()).await {
            Ok(novels) => novels,
            Err(PortError::Cancelled) => {
                self.model.write().await.status.abandon();
                return Err(PortError::Cancelled);
            }
            Err(e) => {
                warn!(error = %e, "Failed to load novels");
                self.model
                    .write()
                    .await
                    .status
                    .fail(user_message(&e, LISTING_FALLBACK));
                return Err(e);
            }
        };

        let ids: Vec<NovelId> = novels.iter().map(|novel| novel.id).collect();
        let session = self.state.session.current();
        let stats = match until_cancelled(cancel, async {
            Ok(fetch_stats_batch(self.state.backend.as_ref(), &ids, session.as_ref()).await)
        })
        .await
        {
            Ok(stats) => stats,
            Err(e) => {
                self.model.write().await.status.abandon();
                return Err(e);
            }
        };

        let mut model = self.model.write().await;
        model.novels = novels;
        model.stats = stats;
        model.status.succeed(None);
        info!(count = model.novels.len(), "Novels loaded");
        Ok(model.novels.len())
    }
}
