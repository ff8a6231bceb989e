//! services/client/src/session/watcher.rs
//!
//! Background task that notices session writes made through another handle to
//! the same store (another process sharing the session file, or another manager
//! sharing a `MemoryStore`) and re-validates the local copy.

use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls the store's revision every `interval` until `cancellation_token` fires.
pub fn spawn_session_watcher(
    manager: Arc<SessionManager>,
    interval: Duration,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Session watcher started.");
        let mut last_seen = manager.store().revision().ok();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Session watcher cancelled.");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let revision = match manager.store().revision() {
                Ok(revision) => revision,
                Err(e) => {
                    warn!(error = %e, "Session watcher could not read the store revision");
                    continue;
                }
            };
            if last_seen == Some(revision) {
                continue;
            }
            debug!(revision, "Session store revision changed");
            last_seen = Some(revision);

            if let Err(e) = manager.revalidate() {
                warn!(error = %e, "Session re-validation failed");
            }
        }
    })
}
