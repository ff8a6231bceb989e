//! Chapter-by-chapter reading with first / previous / next / last controls.

use crate::state::ClientState;
use crate::views::{until_cancelled, ViewStatus};
use scroll_saga_core::domain::{Chapter, ChapterStub, NovelId};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::navigation::{ChapterCursor, ChapterMove};
use scroll_saga_core::ports::{PortError, PortResult};
use scroll_saga_core::sequence::RequestSequencer;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const CHAPTER_FALLBACK: &str = "Unable to load this chapter. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct ReaderModel {
    pub cursor: ChapterCursor,
    pub current: Option<Chapter>,
    pub status: ViewStatus,
}

/// Which navigation buttons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavControls {
    pub first: bool,
    pub previous: bool,
    pub next: bool,
    pub last: bool,
}

#[derive(Clone)]
pub struct ChapterReader {
    state: ClientState,
    novel_id: NovelId,
    sequencer: Arc<RequestSequencer>,
    model: Arc<RwLock<ReaderModel>>,
}

impl ChapterReader {
    pub fn new(state: ClientState, novel_id: NovelId) -> Self {
        Self {
            state,
            novel_id,
            sequencer: Arc::new(RequestSequencer::new()),
            model: Arc::new(RwLock::new(ReaderModel::default())),
        }
    }

    pub async fn snapshot(&self) -> ReaderModel {
        self.model.read().await.clone()
    }

    /// Replaces the chapter list, e.g. after the novel details were (re)loaded.
    pub async fn set_chapters(&self, chapters: Vec<ChapterStub>) {
        let mut model = self.model.write().await;
        model.cursor = ChapterCursor::new(chapters);
        model.current = None;
    }

    pub async fn controls(&self) -> NavControls {
        let model = self.model.read().await;
        let cursor = &model.cursor;
        match cursor.current() {
            None => NavControls {
                first: !cursor.chapters().is_empty(),
                last: !cursor.chapters().is_empty(),
                ..NavControls::default()
            },
            Some(_) => NavControls {
                first: cursor.has_previous(),
                previous: cursor.has_previous(),
                next: cursor.has_next(),
                last: cursor.has_next(),
            },
        }
    }

    pub async fn first(&self, cancel: &CancellationToken) -> PortResult<Option<Chapter>> {
        self.go(ChapterMove::First, cancel).await
    }

    pub async fn last(&self, cancel: &CancellationToken) -> PortResult<Option<Chapter>> {
        self.go(ChapterMove::Last, cancel).await
    }

    pub async fn next(&self, cancel: &CancellationToken) -> PortResult<Option<Chapter>> {
        self.go(ChapterMove::Next, cancel).await
    }

    pub async fn previous(&self, cancel: &CancellationToken) -> PortResult<Option<Chapter>> {
        self.go(ChapterMove::Previous, cancel).await
    }

    pub async fn select(&self, number: u32, cancel: &CancellationToken) -> PortResult<Option<Chapter>> {
        self.go(ChapterMove::Select(number), cancel).await
    }

    /// Fetches the chapter `movement` points at. A move with no target (past the
    /// last chapter, unknown number) returns `Ok(None)` without a request.
    pub async fn go(
        &self,
        movement: ChapterMove,
        cancel: &CancellationToken,
    ) -> PortResult<Option<Chapter>> {
        let (target, token) = {
            let mut model = self.model.write().await;
            let Some(target) = model.cursor.resolve(movement) else {
                debug!(novel_id = self.novel_id, ?movement, "Chapter move disabled");
                return Ok(None);
            };
            model.status.begin();
            (target, self.sequencer.issue())
        };

        let result =
            until_cancelled(cancel, self.state.backend.chapter(self.novel_id, target)).await;
        if matches!(result, Err(PortError::Cancelled)) {
            let mut model = self.model.write().await;
            if self.sequencer.is_latest(token) {
                model.status.abandon();
            }
            return Err(PortError::Cancelled);
        }

        let mut model = self.model.write().await;
        if !self.sequencer.is_latest(token) {
            debug!(novel_id = self.novel_id, chapter = target, "Discarding superseded chapter");
            return Ok(None);
        }
        match result {
            Ok(chapter) => {
                model.cursor.move_to(target);
                model.current = Some(chapter.clone());
                model.status.succeed(None);
                Ok(Some(chapter))
            }
            Err(e) => {
                warn!(novel_id = self.novel_id, chapter = target, error = %e, "Chapter load failed");
                model.status.fail(user_message(&e, CHAPTER_FALLBACK));
                Err(e)
            }
        }
    }
}
