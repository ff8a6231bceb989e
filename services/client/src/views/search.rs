//! Search-as-you-type over the catalog.

use crate::state::ClientState;
use crate::views::{fetch_stats_batch, until_cancelled, ViewStatus};
use scroll_saga_core::domain::{Novel, NovelId, NovelStats};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::ports::{PortError, PortResult};
use scroll_saga_core::sequence::RequestSequencer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const SEARCH_FALLBACK: &str = "Unable to load search results. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct SearchModel {
    /// The query as typed.
    pub query: String,
    pub results: Vec<Novel>,
    pub stats: HashMap<NovelId, NovelStats>,
    pub status: ViewStatus,
}

/// What happened to one keystroke's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query was blank, results were cleared without a request.
    Cleared,
    /// Results were applied; carries their count.
    Applied(usize),
    /// A newer keystroke superseded this one, its response was dropped.
    Stale,
}

#[derive(Clone)]
pub struct SearchView {
    state: ClientState,
    sequencer: Arc<RequestSequencer>,
    model: Arc<RwLock<SearchModel>>,
}

impl SearchView {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            sequencer: Arc::new(RequestSequencer::new()),
            model: Arc::new(RwLock::new(SearchModel::default())),
        }
    }

    pub async fn snapshot(&self) -> SearchModel {
        self.model.read().await.clone()
    }

    /// Runs one search for `value`. Calls may overlap; only the newest one is applied.
    pub async fn set_query(
        &self,
        value: &str,
        cancel: &CancellationToken,
    ) -> PortResult<SearchOutcome> {
        let token = {
            let mut model = self.model.write().await;
            let token = self.sequencer.issue();
            model.query = value.to_string();
            if value.trim().is_empty() {
                model.results.clear();
                model.stats.clear();
                model.status = ViewStatus::default();
                return Ok(SearchOutcome::Cleared);
            }
            model.status.begin();
            token
        };

        let response = until_cancelled(cancel, self.state.backend.search_novels(value)).await;
        if matches!(response, Err(PortError::Cancelled)) {
            let mut model = self.model.write().await;
            if self.sequencer.is_latest(token) {
                model.status.abandon();
            }
            return Err(PortError::Cancelled);
        }

        // Tokens are issued under the lock, so checking under the lock cannot
        // let a stale response slip in after a newer query.
        let (ids, count) = {
            let mut model = self.model.write().await;
            if !self.sequencer.is_latest(token) {
                debug!(query = value, "Discarding stale search response");
                return Ok(SearchOutcome::Stale);
            }
            let results = match response {
                Ok(results) => results,
                Err(e) => {
                    warn!(query = value, error = %e, "Search failed");
                    model.results.clear();
                    model.stats.clear();
                    model.status.fail(user_message(&e, SEARCH_FALLBACK));
                    return Err(e);
                }
            };
            let ids: Vec<NovelId> = results.iter().map(|novel| novel.id).collect();
            let count = results.len();
            model.results = results;
            model.stats.clear();
            model.status.succeed(None);
            (ids, count)
        };

        let session = self.state.session.current();
        let stats = until_cancelled(cancel, async {
            Ok(fetch_stats_batch(self.state.backend.as_ref(), &ids, session.as_ref()).await)
        })
        .await?;

        let mut model = self.model.write().await;
        if !self.sequencer.is_latest(token) {
            debug!(query = value, "Discarding stale search stats");
            return Ok(SearchOutcome::Stale);
        }
        model.stats = stats;
        Ok(SearchOutcome::Applied(count))
    }
}
