//! Batched per-novel stats lookups for list pages.

use futures::future::join_all;
use scroll_saga_core::domain::{NovelId, NovelStats, Session};
use scroll_saga_core::ports::NovelBackend;
use std::collections::HashMap;
use tracing::debug;

/// Fetches stats for every distinct id concurrently. Ids whose lookup failed are
/// simply absent from the map, so one bad novel never blanks the whole list.
pub async fn fetch_stats_batch(
    backend: &dyn NovelBackend,
    novel_ids: &[NovelId],
    session: Option<&Session>,
) -> HashMap<NovelId, NovelStats> {
    let mut unique = novel_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let lookups = unique.into_iter().map(|novel_id| async move {
        (novel_id, backend.novel_stats(novel_id, session).await)
    });

    join_all(lookups)
        .await
        .into_iter()
        .filter_map(|(novel_id, result)| match result {
            Ok(stats) => Some((novel_id, stats)),
            Err(e) => {
                debug!(novel_id, error = %e, "Skipping stats for novel");
                None
            }
        })
        .collect()
}
