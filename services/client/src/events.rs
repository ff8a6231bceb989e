//! services/client/src/events.rs
//!
//! Process-wide notifications so mounted views can refresh without a reload.

use scroll_saga_core::domain::{Session, UserId};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The stored session changed: login, logout, rename, or a write from another handle.
    SessionChanged(Option<Session>),
    /// A profile (including its photo) was edited.
    ProfileUpdated { user_id: UserId },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ClientEvent) {
        // Nobody listening is fine.
        if self.sender.send(event).is_err() {
            debug!("Client event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
