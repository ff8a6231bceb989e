//! crates/scroll_saga_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client's core logic.
//! The views talk to the backend and to durable storage only through these traits,
//! so the HTTP adapter and the session file can be swapped for fakes.

use crate::domain::{
    Chapter, Credentials, LoginOutcome, Novel, NovelDetails, NovelId, NovelStats, PhotoUpload,
    ProfileUpdate, ProfileUpdateOutcome, Rating, Registration, Review, Session, UserId,
    UserProfile,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        status: u16,
        /// The `message` (or `error`) field of a JSON error body, when there was one.
        message: Option<String>,
    },
    #[error("Missing user id. Please log in again.")]
    MissingIdentity,
    #[error("{0}")]
    InvalidInput(String),
    #[error("You have already rated this novel.")]
    RatingLocked,
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PortError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Durable Key-Value Storage
//=========================================================================================

/// One change inside an atomic storage batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMutation {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StoreMutation {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        StoreMutation::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        StoreMutation::Remove {
            key: key.to_string(),
        }
    }
}

/// An origin-scoped string key-value store that survives restarts.
///
/// Reads are synchronous so the session can be consulted at render time.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Applies every mutation or none of them. Readers never observe a partial batch.
    fn apply(&self, mutations: &[StoreMutation]) -> PortResult<()>;

    /// Monotonically increasing counter bumped by every applied batch,
    /// including batches written through another handle to the same store.
    fn revision(&self) -> PortResult<u64>;
}

//=========================================================================================
// Backend Port
//=========================================================================================

/// The remote Scroll Saga REST backend.
///
/// Operations that need an identity take the `Session` explicitly, so a write can
/// never be issued without one.
#[async_trait]
pub trait NovelBackend: Send + Sync {
    // --- Catalog ---
    async fn list_novels(&self) -> PortResult<Vec<Novel>>;

    async fn search_novels(&self, query: &str) -> PortResult<Vec<Novel>>;

    async fn novel_details(&self, novel_id: NovelId, slug: &str) -> PortResult<NovelDetails>;

    async fn chapter(&self, novel_id: NovelId, number: u32) -> PortResult<Chapter>;

    // --- Auth ---
    async fn login(&self, credentials: &Credentials) -> PortResult<LoginOutcome>;

    /// Returns the backend's confirmation message.
    async fn register(&self, registration: &Registration) -> PortResult<Option<String>>;

    // --- Users ---
    async fn list_users(&self) -> PortResult<Vec<UserProfile>>;

    async fn user(&self, user_id: UserId) -> PortResult<UserProfile>;

    async fn own_profile(&self, session: &Session) -> PortResult<UserProfile>;

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> PortResult<ProfileUpdateOutcome>;

    async fn upload_profile_photo(
        &self,
        session: &Session,
        photo: &PhotoUpload,
    ) -> PortResult<Option<String>>;

    // --- Book list ---
    async fn booklist(&self, session: &Session) -> PortResult<Vec<Novel>>;

    async fn save_novel(&self, session: &Session, novel_id: NovelId) -> PortResult<Option<String>>;

    async fn unsave_novel(
        &self,
        session: &Session,
        novel_id: NovelId,
    ) -> PortResult<Option<String>>;

    // --- Stats, ratings and reviews ---
    async fn novel_stats(
        &self,
        novel_id: NovelId,
        session: Option<&Session>,
    ) -> PortResult<NovelStats>;

    async fn track_view(&self, novel_id: NovelId, session: Option<&Session>) -> PortResult<()>;

    async fn rate_novel(
        &self,
        session: &Session,
        novel_id: NovelId,
        rating: Rating,
    ) -> PortResult<Option<String>>;

    async fn reviews(&self, novel_id: NovelId) -> PortResult<Vec<Review>>;

    async fn post_review(
        &self,
        session: &Session,
        novel_id: NovelId,
        text: &str,
    ) -> PortResult<Option<String>>;
}
