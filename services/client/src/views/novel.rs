//! The novel detail page: metadata, stats, rating, reviews, and the reader.

use crate::state::ClientState;
use crate::views::{until_cancelled, ChapterReader, ViewStatus};
use scroll_saga_core::domain::{novel_slug, NovelDetails, NovelId, NovelStats, Rating, Review};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::ports::{PortError, PortResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DETAILS_FALLBACK: &str = "Unable to load this novel. Please refresh and try again.";
const RATING_FALLBACK: &str = "Unable to submit your rating. Please refresh and try again.";
const RATING_DEFAULT: &str = "Thanks for rating!";
const REVIEW_FALLBACK: &str = "Unable to post your comment. Please refresh and try again.";
const REVIEW_DEFAULT: &str = "Comment posted.";
const REVIEWS_FALLBACK: &str = "Unable to load comments. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct NovelModel {
    pub details: Option<NovelDetails>,
    pub stats: Option<NovelStats>,
    pub reviews: Vec<Review>,
    pub status: ViewStatus,
    pub rating_status: ViewStatus,
    pub rating_in_flight: bool,
    /// Set once the backend accepted a rating from this page.
    pub rating_confirmed: bool,
    pub review_status: ViewStatus,
}

impl NovelModel {
    /// The rating control is locked while a submission is pending, after the
    /// backend accepted one, and once the server reports the user's own rating.
    pub fn rating_locked(&self) -> bool {
        self.rating_in_flight
            || self.rating_confirmed
            || self
                .stats
                .as_ref()
                .is_some_and(|stats| stats.user_rating.is_some())
    }
}

#[derive(Clone)]
pub struct NovelView {
    state: ClientState,
    novel_id: NovelId,
    slug: String,
    reader: ChapterReader,
    model: Arc<RwLock<NovelModel>>,
}

impl NovelView {
    /// `title` may be the display title or an already-built slug.
    pub fn new(state: ClientState, novel_id: NovelId, title: &str) -> Self {
        Self {
            reader: ChapterReader::new(state.clone(), novel_id),
            state,
            novel_id,
            slug: novel_slug(title),
            model: Arc::new(RwLock::new(NovelModel::default())),
        }
    }

    pub fn novel_id(&self) -> NovelId {
        self.novel_id
    }

    pub fn reader(&self) -> &ChapterReader {
        &self.reader
    }

    pub async fn snapshot(&self) -> NovelModel {
        self.model.read().await.clone()
    }

    pub async fn rating_locked(&self) -> bool {
        self.model.read().await.rating_locked()
    }

    /// Loads details (with chapter stubs and reviews), then stats, then records
    /// a view. Only the details request can fail the load.
    pub async fn load(&self, cancel: &CancellationToken) -> PortResult<NovelDetails> {
        self.model.write().await.status.begin();

        let backend = &self.state.backend;
        let details =
            match until_cancelled(cancel, backend.novel_details(self.novel_id, &self.slug)).await {
                Ok(details) => details,
                Err(PortError::Cancelled) => {
                    self.model.write().await.status.abandon();
                    return Err(PortError::Cancelled);
                }
                Err(e) => {
                    warn!(novel_id = self.novel_id, error = %e, "Failed to load novel details");
                    self.model
                        .write()
                        .await
                        .status
                        .fail(user_message(&e, DETAILS_FALLBACK));
                    return Err(e);
                }
            };

        self.reader.set_chapters(details.chapters.clone()).await;
        {
            let mut model = self.model.write().await;
            model.reviews = details.reviews.clone();
            model.details = Some(details.clone());
            model.status.succeed(None);
        }

        match self.refresh_stats(cancel).await {
            Ok(_) => {}
            Err(PortError::Cancelled) => return Err(PortError::Cancelled),
            Err(e) => debug!(novel_id = self.novel_id, error = %e, "Stats unavailable"),
        }

        let session = self.state.session.current();
        match until_cancelled(cancel, backend.track_view(self.novel_id, session.as_ref())).await {
            Ok(()) => {}
            Err(PortError::Cancelled) => return Err(PortError::Cancelled),
            Err(e) => debug!(novel_id = self.novel_id, error = %e, "View tracking failed"),
        }

        info!(
            novel_id = self.novel_id,
            chapters = details.chapters.len(),
            "Novel loaded"
        );
        Ok(details)
    }

    /// Re-reads stats, sending the identity header when logged in so the
    /// user's own rating comes back.
    pub async fn refresh_stats(&self, cancel: &CancellationToken) -> PortResult<NovelStats> {
        let session = self.state.session.current();
        let stats = until_cancelled(
            cancel,
            self.state.backend.novel_stats(self.novel_id, session.as_ref()),
        )
        .await?;
        self.model.write().await.stats = Some(stats.clone());
        Ok(stats)
    }

    pub async fn refresh_reviews(&self, cancel: &CancellationToken) -> PortResult<Vec<Review>> {
        let reviews = until_cancelled(cancel, self.state.backend.reviews(self.novel_id)).await?;
        self.model.write().await.reviews = reviews.clone();
        Ok(reviews)
    }

    /// Submits a 1..=5 star rating. Rejected locally without a request when
    /// logged out, already rated, or out of range. Stats are re-fetched on
    /// success instead of being patched locally.
    pub async fn submit_rating(
        &self,
        value: u8,
        cancel: &CancellationToken,
    ) -> PortResult<NovelStats> {
        let (session, rating) = {
            let mut model = self.model.write().await;
            let session = match self.state.session.require() {
                Ok(session) => session,
                Err(e) => return Err(model.rating_status.reject(e)),
            };
            if model.rating_locked() {
                return Err(model.rating_status.reject(PortError::RatingLocked));
            }
            let Some(rating) = Rating::new(value) else {
                return Err(model.rating_status.reject(PortError::InvalidInput(
                    "Please choose a rating between 1 and 5.".to_string(),
                )));
            };
            model.rating_in_flight = true;
            model.rating_status.begin();
            (session, rating)
        };

        let result = until_cancelled(
            cancel,
            self.state.backend.rate_novel(&session, self.novel_id, rating),
        )
        .await;

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                let mut model = self.model.write().await;
                model.rating_in_flight = false;
                if e == PortError::Cancelled {
                    model.rating_status.abandon();
                } else {
                    warn!(novel_id = self.novel_id, error = %e, "Rating failed");
                    model.rating_status.fail(user_message(&e, RATING_FALLBACK));
                }
                return Err(e);
            }
        };
        info!(novel_id = self.novel_id, rating = rating.value(), "Rating submitted");

        let refreshed = until_cancelled(
            cancel,
            self.state.backend.novel_stats(self.novel_id, Some(&session)),
        )
        .await;

        let mut model = self.model.write().await;
        model.rating_in_flight = false;
        model.rating_confirmed = true;
        match refreshed {
            Ok(stats) => {
                model.stats = Some(stats.clone());
                model
                    .rating_status
                    .succeed(Some(message.unwrap_or_else(|| RATING_DEFAULT.to_string())));
                Ok(stats)
            }
            Err(PortError::Cancelled) => {
                model.rating_status.abandon();
                Err(PortError::Cancelled)
            }
            Err(e) => {
                warn!(novel_id = self.novel_id, error = %e, "Stats refresh after rating failed");
                model
                    .rating_status
                    .succeed(Some(message.unwrap_or_else(|| RATING_DEFAULT.to_string())));
                Err(e)
            }
        }
    }

    /// Posts a comment, then re-fetches the whole review list.
    pub async fn post_review(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> PortResult<Vec<Review>> {
        let session = {
            let mut model = self.model.write().await;
            let session = match self.state.session.require() {
                Ok(session) => session,
                Err(e) => return Err(model.review_status.reject(e)),
            };
            if text.trim().is_empty() {
                return Err(model.review_status.reject(PortError::InvalidInput(
                    "Please write a comment before posting.".to_string(),
                )));
            }
            model.review_status.begin();
            session
        };

        let posted = until_cancelled(
            cancel,
            self.state.backend.post_review(&session, self.novel_id, text.trim()),
        )
        .await;
        let message = match posted {
            Ok(message) => message.unwrap_or_else(|| REVIEW_DEFAULT.to_string()),
            Err(e) => {
                let mut model = self.model.write().await;
                if e == PortError::Cancelled {
                    model.review_status.abandon();
                } else {
                    warn!(novel_id = self.novel_id, error = %e, "Posting comment failed");
                    model.review_status.fail(user_message(&e, REVIEW_FALLBACK));
                }
                return Err(e);
            }
        };

        let refreshed = until_cancelled(cancel, self.state.backend.reviews(self.novel_id)).await;
        let mut model = self.model.write().await;
        match refreshed {
            Ok(reviews) => {
                model.reviews = reviews.clone();
                model.review_status.succeed(Some(message));
                Ok(reviews)
            }
            Err(PortError::Cancelled) => {
                model.review_status.abandon();
                Err(PortError::Cancelled)
            }
            Err(e) => {
                model.review_status.succeed(Some(message));
                model.review_status.error = Some(user_message(&e, REVIEWS_FALLBACK));
                Err(e)
            }
        }
    }
}
