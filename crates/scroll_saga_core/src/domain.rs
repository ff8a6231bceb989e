//! crates/scroll_saga_core/src/domain.rs
//!
//! Defines the pure, core data structures for the client.
//! These structs are independent of the wire format and of the session storage layout.

use bytes::Bytes;
use chrono::{DateTime, Utc};

pub type UserId = u64;
pub type NovelId = u64;

/// The identity of the signed-in user, as held by the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Novel {
    pub id: NovelId,
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: Option<String>,
    /// Either an absolute URL or a bare file name under `/static/images/`.
    pub cover_image: Option<String>,
    pub published_at: Option<String>,
}

impl Novel {
    pub fn slug(&self) -> String {
        novel_slug(&self.title)
    }
}

/// A chapter as listed by the novel detail endpoint, without its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterStub {
    pub number: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub novel_id: NovelId,
    pub number: u32,
    pub name: String,
    pub content: String,
}

/// Everything the novel detail endpoint returns in one response.
#[derive(Debug, Clone, PartialEq)]
pub struct NovelDetails {
    pub novel: Novel,
    pub chapters: Vec<ChapterStub>,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Option<u64>,
    pub author: String,
    pub text: String,
    pub profile_photo: Option<String>,
    pub published_at: Option<String>,
}

/// A star rating between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Server-aggregated metrics for one novel.
#[derive(Debug, Clone, PartialEq)]
pub struct NovelStats {
    pub average_rating: f64,
    pub ratings_count: u64,
    pub view_count: u64,
    pub unique_viewers: u64,
    /// The current user's own rating, when the request carried an identity.
    pub user_rating: Option<u8>,
}

impl NovelStats {
    pub fn display_average(&self) -> f64 {
        normalize_average_rating(self.average_rating, DEFAULT_AVERAGE_RATING)
    }

    pub fn stars(&self) -> String {
        rating_stars(self.average_rating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub role: String,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A file chosen for upload, e.g. a profile photo.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl PhotoUpload {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub bio: Option<String>,
    pub profile_photo: Option<PhotoUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub bio: String,
}

/// What the backend reports after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user_id: UserId,
    pub username: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdateOutcome {
    pub profile: Option<UserProfile>,
    pub message: Option<String>,
}

pub const DEFAULT_AVERAGE_RATING: f64 = 3.0;

/// Lowercase, hyphenated form of a title used in novel URLs.
pub fn novel_slug(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Clamps an average rating into 1..=5, using `fallback` for missing or non-positive values.
pub fn normalize_average_rating(rating: f64, fallback: f64) -> f64 {
    if rating.is_nan() || rating <= 0.0 {
        return fallback;
    }
    rating.clamp(1.0, 5.0)
}

pub fn rating_stars(average: f64) -> String {
    let filled = normalize_average_rating(average, DEFAULT_AVERAGE_RATING).round() as usize;
    format!("{}{}", "\u{2605}".repeat(filled), "\u{2606}".repeat(5 - filled))
}
