//! services/client/src/adapters/wire.rs
//!
//! JSON shapes exchanged with the backend. The backend has renamed fields across
//! revisions, so every record accepts each known spelling and converts to the
//! domain type in one place.

use scroll_saga_core::domain::{
    Chapter, ChapterStub, Novel, NovelDetails, NovelId, NovelStats, Review, UserProfile,
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Ids arrive as numbers or numeric strings depending on the endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Number(u64),
    Text(String),
}

impl WireId {
    pub(crate) fn to_id(&self) -> Option<u64> {
        match self {
            WireId::Number(value) => Some(*value),
            WireId::Text(value) => value.trim().parse().ok(),
        }
    }
}

fn first_id(candidates: &[&Option<WireId>]) -> Option<u64> {
    candidates
        .iter()
        .find_map(|candidate| candidate.as_ref().and_then(WireId::to_id))
}

/// Chapter numbers share the id tolerance but must fit a `u32`.
fn first_number(candidates: &[&Option<WireId>]) -> Option<u32> {
    first_id(candidates).and_then(|value| u32::try_from(value).ok())
}

fn first_text(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|candidate| candidate.as_deref())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn count(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or_default()
}

/// `message` or `error` from any JSON body, used for acknowledgements and failures.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MessageBody {
    pub(crate) fn into_message(self) -> Option<String> {
        first_text(&[&self.message, &self.error])
    }
}

//=========================================================================================
// Novels
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NovelRecord {
    novel_id: Option<WireId>,
    id: Option<WireId>,
    novel_title: Option<String>,
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    genre: Option<String>,
    cover_image: Option<String>,
    image: Option<String>,
    publish_date: Option<String>,
    published_date: Option<String>,
    created_at: Option<String>,
}

impl NovelRecord {
    /// `None` when the record has no usable id.
    pub(crate) fn to_domain(self) -> Option<Novel> {
        let id = first_id(&[&self.novel_id, &self.id])?;
        Some(Novel {
            id,
            title: first_text(&[&self.novel_title, &self.title])
                .unwrap_or_else(|| "Untitled".to_string()),
            author: first_text(&[&self.author])
                .unwrap_or_else(|| "Unknown author".to_string()),
            description: first_text(&[&self.description, &self.summary])
                .unwrap_or_default(),
            genre: first_text(&[&self.genre]),
            cover_image: first_text(&[&self.cover_image, &self.image]),
            published_at: first_text(&[&self.publish_date, &self.published_date, &self.created_at]),
        })
    }
}

/// Novel lists come bare (`/api/novels`) or wrapped (`results`, `novels`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NovelListPayload {
    Bare(Vec<NovelRecord>),
    Wrapped {
        #[serde(default)]
        results: Option<Vec<NovelRecord>>,
        #[serde(default)]
        novels: Option<Vec<NovelRecord>>,
    },
}

impl NovelListPayload {
    pub(crate) fn into_domain(self) -> Vec<Novel> {
        let records = match self {
            NovelListPayload::Bare(records) => records,
            NovelListPayload::Wrapped { results, novels } => {
                results.or(novels).unwrap_or_default()
            }
        };
        records.into_iter().filter_map(NovelRecord::to_domain).collect()
    }
}

//=========================================================================================
// Chapters
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterStubRecord {
    chapter_number: Option<WireId>,
    number: Option<WireId>,
    chapter_name: Option<String>,
    name: Option<String>,
    title: Option<String>,
}

impl ChapterStubRecord {
    fn to_domain(self) -> Option<ChapterStub> {
        let number = first_number(&[&self.chapter_number, &self.number])?;
        Some(ChapterStub {
            number,
            name: first_text(&[&self.chapter_name, &self.name, &self.title])
                .unwrap_or_else(|| format!("Chapter {}", number)),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterRecord {
    chapter_number: Option<WireId>,
    number: Option<WireId>,
    chapter_name: Option<String>,
    name: Option<String>,
    title: Option<String>,
    content: Option<String>,
    chapter_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChapterPayload {
    Wrapped { chapter: ChapterRecord },
    Bare(ChapterRecord),
}

impl ChapterPayload {
    /// Falls back to the requested number when the body does not echo it.
    pub(crate) fn into_domain(self, novel_id: NovelId, requested: u32) -> Chapter {
        let record = match self {
            ChapterPayload::Wrapped { chapter } => chapter,
            ChapterPayload::Bare(record) => record,
        };
        let number = first_number(&[&record.chapter_number, &record.number]).unwrap_or(requested);
        Chapter {
            novel_id,
            number,
            name: first_text(&[&record.chapter_name, &record.name, &record.title])
                .unwrap_or_else(|| format!("Chapter {}", number)),
            content: record.content.or(record.chapter_content).unwrap_or_default(),
        }
    }
}

//=========================================================================================
// Reviews
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRecord {
    review_id: Option<WireId>,
    id: Option<WireId>,
    username: Option<String>,
    author: Option<String>,
    review_text: Option<String>,
    content: Option<String>,
    comment: Option<String>,
    profile_photo: Option<String>,
    created_at: Option<String>,
    publish_date: Option<String>,
    published_at: Option<String>,
}

impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: first_id(&[&self.review_id, &self.id]),
            author: first_text(&[&self.username, &self.author])
                .unwrap_or_else(|| "Anonymous".to_string()),
            text: first_text(&[&self.review_text, &self.content, &self.comment])
                .unwrap_or_default(),
            profile_photo: first_text(&[&self.profile_photo]),
            published_at: first_text(&[&self.published_at, &self.publish_date, &self.created_at]),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReviewListPayload {
    Bare(Vec<ReviewRecord>),
    Wrapped {
        #[serde(default)]
        reviews: Vec<ReviewRecord>,
    },
}

impl ReviewListPayload {
    pub(crate) fn into_domain(self) -> Vec<Review> {
        let records = match self {
            ReviewListPayload::Bare(records) => records,
            ReviewListPayload::Wrapped { reviews } => reviews,
        };
        records.into_iter().map(ReviewRecord::to_domain).collect()
    }
}

//=========================================================================================
// Novel Details
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct NovelDetailsPayload {
    novel: Option<NovelRecord>,
    #[serde(default)]
    chapters: Vec<ChapterStubRecord>,
    #[serde(default)]
    reviews: Vec<ReviewRecord>,
    /// Older revisions put the novel fields at the top level.
    #[serde(flatten)]
    inline: NovelRecord,
}

impl NovelDetailsPayload {
    pub(crate) fn into_domain(self, requested: NovelId) -> NovelDetails {
        let record = self.novel.unwrap_or(self.inline);
        let novel = record.to_domain().unwrap_or_else(|| Novel {
            id: requested,
            title: "Untitled".to_string(),
            author: "Unknown author".to_string(),
            description: String::new(),
            genre: None,
            cover_image: None,
            published_at: None,
        });
        NovelDetails {
            novel,
            chapters: self
                .chapters
                .into_iter()
                .filter_map(ChapterStubRecord::to_domain)
                .collect(),
            reviews: self
                .reviews
                .into_iter()
                .map(ReviewRecord::to_domain)
                .collect(),
        }
    }
}

//=========================================================================================
// Stats
//=========================================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct StatsRecord {
    average_rating: Option<f64>,
    ratings_count: Option<f64>,
    rating_count: Option<f64>,
    view_count: Option<f64>,
    views: Option<f64>,
    unique_viewers: Option<f64>,
    unique_views: Option<f64>,
    user_rating: Option<f64>,
    current_user_rating: Option<f64>,
}

impl StatsRecord {
    pub(crate) fn to_domain(self) -> NovelStats {
        NovelStats {
            average_rating: self.average_rating.unwrap_or_default(),
            ratings_count: count(self.ratings_count.or(self.rating_count)),
            view_count: count(self.view_count.or(self.views)),
            unique_viewers: count(self.unique_viewers.or(self.unique_views)),
            user_rating: self
                .user_rating
                .or(self.current_user_rating)
                .filter(|value| *value >= 1.0)
                .map(|value| value.round().min(5.0) as u8),
        }
    }
}

//=========================================================================================
// Users and Auth
//=========================================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserRecord {
    user_id: Option<WireId>,
    id: Option<WireId>,
    username: Option<String>,
    email_address: Option<String>,
    email: Option<String>,
    user_bio: Option<String>,
    bio: Option<String>,
    role: Option<String>,
    profile_photo: Option<String>,
}

impl UserRecord {
    pub(crate) fn to_domain(self) -> Option<UserProfile> {
        let user_id = first_id(&[&self.user_id, &self.id])?;
        Some(UserProfile {
            user_id,
            username: first_text(&[&self.username]).unwrap_or_default(),
            email: first_text(&[&self.email_address, &self.email]).unwrap_or_default(),
            // The backend stores a literal "None" for an empty bio.
            bio: first_text(&[&self.user_bio, &self.bio]).filter(|bio| bio != "None"),
            role: first_text(&[&self.role]).unwrap_or_else(|| "user".to_string()),
            profile_photo: first_text(&[&self.profile_photo]),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserListPayload {
    Bare(Vec<UserRecord>),
    Wrapped {
        #[serde(default)]
        users: Vec<UserRecord>,
    },
}

impl UserListPayload {
    pub(crate) fn into_domain(self) -> Vec<UserProfile> {
        let records = match self {
            UserListPayload::Bare(records) => records,
            UserListPayload::Wrapped { users } => users,
        };
        records.into_iter().filter_map(UserRecord::to_domain).collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileUpdatePayload {
    message: Option<String>,
    user: Option<UserRecord>,
    #[serde(flatten)]
    inline: UserRecord,
}

impl ProfileUpdatePayload {
    pub(crate) fn into_parts(self) -> (Option<UserProfile>, Option<String>) {
        let profile = match self.user {
            Some(user) => user.to_domain(),
            None => self.inline.to_domain(),
        };
        (profile, first_text(&[&self.message]))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    user_id: Option<WireId>,
    id: Option<WireId>,
    username: Option<String>,
    message: Option<String>,
    user: Option<UserRecord>,
}

impl LoginPayload {
    /// The signed-in user's id and name, when the backend reported an id.
    pub(crate) fn into_parts(self) -> (Option<u64>, Option<String>, Option<String>) {
        let nested = self.user.and_then(UserRecord::to_domain);
        let user_id = first_id(&[&self.user_id, &self.id])
            .or_else(|| nested.as_ref().map(|user| user.user_id));
        let username = first_text(&[&self.username]).or_else(|| {
            nested
                .map(|user| user.username)
                .filter(|name| !name.is_empty())
        });
        (user_id, username, first_text(&[&self.message]))
    }
}

//=========================================================================================
// Request Bodies
//=========================================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub bio: Option<&'a str>,
    /// A `data:<mime>;base64,...` URL.
    pub profile_photo: Option<String>,
}

/// The backend has read both spellings of each field, so both are sent.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileUpdateBody<'a> {
    pub username: &'a str,
    pub email_address: &'a str,
    pub email: &'a str,
    pub user_bio: &'a str,
    pub bio: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RatingBody {
    pub rating: u8,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewBody<'a> {
    pub review_text: &'a str,
}
