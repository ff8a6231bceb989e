//! services/client/src/views/mod.rs
//!
//! View models: the transient state of each page plus the async actions that
//! fetch into it. Every action takes a `CancellationToken`; once it fires the
//! in-flight request is abandoned and nothing is committed.

pub mod auth;
pub mod booklist;
pub mod header;
pub mod listing;
pub mod novel;
pub mod profile;
pub mod reader;
pub mod search;
pub mod stats;

pub use auth::AuthFlow;
pub use booklist::{BookListView, SavedNovels, ToggleOutcome};
pub use header::NavigationHeader;
pub use listing::ListingView;
pub use novel::NovelView;
pub use profile::{ProfileView, UserDirectory};
pub use reader::{ChapterReader, NavControls};
pub use search::{SearchOutcome, SearchView};
pub use stats::fetch_stats_batch;

use scroll_saga_core::messages::{user_message, GENERIC_FAILURE};
use scroll_saga_core::ports::{PortError, PortResult};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Inline status text for one action: loading flag plus error or success message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ViewStatus {
    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    pub(crate) fn succeed(&mut self, message: Option<String>) {
        self.loading = false;
        self.error = None;
        self.success = message;
    }

    /// Drops the loading flag of a cancelled action and keeps the previous text.
    pub(crate) fn abandon(&mut self) {
        self.loading = false;
    }

    /// Records a precondition failure and hands the error back to the caller.
    pub(crate) fn reject(&mut self, error: PortError) -> PortError {
        self.success = None;
        self.fail(user_message(&error, GENERIC_FAILURE));
        error
    }
}

/// Races `future` against the token. A cancelled token always wins, even when the
/// request completed in the same instant, so callers can commit on `Ok` blindly.
pub(crate) async fn until_cancelled<T, F>(token: &CancellationToken, future: F) -> PortResult<T>
where
    F: Future<Output = PortResult<T>>,
{
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(PortError::Cancelled),
        result = future => result,
    };
    if token.is_cancelled() {
        return Err(PortError::Cancelled);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_token_discards_a_finished_result() {
        let token = CancellationToken::new();
        token.cancel();
        let result = until_cancelled(&token, async { Ok::<_, PortError>(1) }).await;
        assert_eq!(result, Err(PortError::Cancelled));
    }

    #[tokio::test]
    async fn live_token_passes_the_result_through() {
        let token = CancellationToken::new();
        let result = until_cancelled(&token, async { Ok::<_, PortError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn abandon_only_clears_loading() {
        let mut status = ViewStatus {
            loading: true,
            error: Some("old".into()),
            success: None,
        };
        status.abandon();
        assert!(!status.loading);
        assert_eq!(status.error.as_deref(), Some("old"));
    }

    #[test]
    fn reject_sets_inline_text() {
        let mut status = ViewStatus::default();
        let error = status.reject(PortError::MissingIdentity);
        assert_eq!(error, PortError::MissingIdentity);
        assert_eq!(
            status.error.as_deref(),
            Some("Missing user id. Please log in again.")
        );
        assert!(!status.loading);
    }
}
