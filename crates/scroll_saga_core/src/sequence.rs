//! crates/scroll_saga_core/src/sequence.rs
//!
//! Request sequencing for views that can have several requests of the same kind
//! in flight, e.g. search-as-you-type.

use std::sync::atomic::{AtomicU64, Ordering};

/// Token handed out for each issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Issues monotonically increasing tokens. A response may be applied only
/// while its token is still the latest one issued.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_newest_token_is_current() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue();
        assert!(sequencer.is_latest(first));

        let second = sequencer.issue();
        assert!(first < second);
        assert!(!sequencer.is_latest(first));
        assert!(sequencer.is_latest(second));
    }
}
