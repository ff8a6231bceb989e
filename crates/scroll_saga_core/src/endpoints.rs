//! crates/scroll_saga_core/src/endpoints.rs
//!
//! The fixed, versionless endpoint catalog of the Scroll Saga backend and the
//! URL builder that joins it onto the configured base URL.

use crate::domain::{NovelId, UserId};
use urlencoding::encode;

/// Custom header carrying the signed-in user's id (`X-User-Id`; header names are case-insensitive).
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Every backend route the client knows about. Parameters are raw values;
/// `path` percent-encodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Home,
    Novels,
    Search { query: &'a str },
    NovelDetails { novel_id: NovelId, slug: &'a str },
    Chapter { novel_id: NovelId, number: u32 },
    Login,
    Register,
    Users,
    UserDetails { user_id: UserId },
    Profile,
    ProfilePhoto,
    MyBooklist { user_id: UserId },
    SaveNovel { novel_id: NovelId },
    UnsaveNovel { novel_id: NovelId },
    NovelStats { novel_id: NovelId },
    TrackNovelView { novel_id: NovelId },
    RateNovel { novel_id: NovelId },
    NovelReviews { novel_id: NovelId },
    Image { name: &'a str },
}

impl Endpoint<'_> {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Home => "/".to_string(),
            Endpoint::Novels => "/api/novels".to_string(),
            Endpoint::Search { query } => format!("/api/search?query={}", encode(query)),
            Endpoint::NovelDetails { novel_id, slug } => {
                format!("/novel/{}/{}", encode_id(*novel_id), encode(slug))
            }
            Endpoint::Chapter { novel_id, number } => format!(
                "/chapter/{}/{}",
                encode_id(*novel_id),
                encode(&number.to_string())
            ),
            Endpoint::Login => "/api/login".to_string(),
            Endpoint::Register => "/register".to_string(),
            Endpoint::Users => "/api/users".to_string(),
            Endpoint::UserDetails { user_id } => format!("/api/users/{}", encode_id(*user_id)),
            Endpoint::Profile => "/api/profile".to_string(),
            Endpoint::ProfilePhoto => "/api/profile/photo".to_string(),
            Endpoint::MyBooklist { user_id } => {
                format!("/api/my_booklist?user_id={}", encode_id(*user_id))
            }
            Endpoint::SaveNovel { novel_id } => {
                format!("/api/save_novel/{}", encode_id(*novel_id))
            }
            Endpoint::UnsaveNovel { novel_id } => {
                format!("/api/unsave_novel/{}", encode_id(*novel_id))
            }
            Endpoint::NovelStats { novel_id } => {
                format!("/api/novels/{}/stats", encode_id(*novel_id))
            }
            Endpoint::TrackNovelView { novel_id } => {
                format!("/api/novels/{}/view", encode_id(*novel_id))
            }
            Endpoint::RateNovel { novel_id } => {
                format!("/api/novels/{}/rating", encode_id(*novel_id))
            }
            Endpoint::NovelReviews { novel_id } => {
                format!("/api/novels/{}/reviews", encode_id(*novel_id))
            }
            Endpoint::Image { name } => format!("/static/images/{}", encode(name)),
        }
    }
}

fn encode_id(id: u64) -> String {
    encode(&id.to_string()).into_owned()
}

/// The backend's base URL with surrounding whitespace and trailing slashes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase(String);

impl ApiBase {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL for `endpoint`.
    pub fn url(&self, endpoint: &Endpoint<'_>) -> String {
        format!("{}{}", self.0, endpoint.path())
    }

    pub fn image_url(&self, name: &str) -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(self.url(&Endpoint::Image { name }))
    }

    /// Resolves a cover reference: absolute URLs pass through, bare names are static images.
    pub fn cover_url(&self, cover: Option<&str>) -> Option<String> {
        let cover = cover.map(str::trim).filter(|value| !value.is_empty())?;
        if is_absolute_http(cover) {
            return Some(cover.to_string());
        }
        self.image_url(cover)
    }

    /// Like `cover_url`, but inline `data:image/` photos also pass through.
    pub fn profile_photo_url(&self, photo: Option<&str>) -> Option<String> {
        let photo = photo.map(str::trim).filter(|value| !value.is_empty())?;
        if is_absolute_http(photo) || photo.to_ascii_lowercase().starts_with("data:image/") {
            return Some(photo.to_string());
        }
        self.image_url(photo)
    }
}

fn is_absolute_http(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ApiBase {
        ApiBase::new(" https://saga.example.com/// ")
    }

    #[test]
    fn base_url_is_trimmed() {
        assert_eq!(base().as_str(), "https://saga.example.com");
    }

    #[test]
    fn urls_never_contain_a_double_slash_after_the_scheme() {
        let endpoints = [
            Endpoint::Home,
            Endpoint::Novels,
            Endpoint::Search { query: "/leading" },
            Endpoint::NovelDetails {
                novel_id: 7,
                slug: "a/b",
            },
            Endpoint::Chapter {
                novel_id: 7,
                number: 3,
            },
            Endpoint::Profile,
            Endpoint::MyBooklist { user_id: 42 },
            Endpoint::Image { name: "/cover.png" },
        ];
        for endpoint in endpoints {
            let url = base().url(&endpoint);
            assert!(url.starts_with("https://saga.example.com/"), "{url}");
            let rest = url.trim_start_matches("https://");
            assert!(!rest.contains("//"), "{url}");
        }
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let url = base().url(&Endpoint::Search {
            query: "dragon & knight?#/=%",
        });
        assert_eq!(
            url,
            "https://saga.example.com/api/search?query=dragon%20%26%20knight%3F%23%2F%3D%25"
        );

        let url = base().url(&Endpoint::NovelDetails {
            novel_id: 12,
            slug: "tea-&-tales?",
        });
        assert_eq!(url, "https://saga.example.com/novel/12/tea-%26-tales%3F");
    }

    #[test]
    fn catalog_paths_match_the_backend_routes() {
        assert_eq!(Endpoint::Login.path(), "/api/login");
        assert_eq!(Endpoint::Register.path(), "/register");
        assert_eq!(Endpoint::UserDetails { user_id: 5 }.path(), "/api/users/5");
        assert_eq!(Endpoint::SaveNovel { novel_id: 9 }.path(), "/api/save_novel/9");
        assert_eq!(Endpoint::UnsaveNovel { novel_id: 9 }.path(), "/api/unsave_novel/9");
        assert_eq!(Endpoint::NovelStats { novel_id: 9 }.path(), "/api/novels/9/stats");
        assert_eq!(Endpoint::RateNovel { novel_id: 9 }.path(), "/api/novels/9/rating");
        assert_eq!(Endpoint::NovelReviews { novel_id: 9 }.path(), "/api/novels/9/reviews");
        assert_eq!(Endpoint::TrackNovelView { novel_id: 9 }.path(), "/api/novels/9/view");
        assert_eq!(
            Endpoint::Chapter {
                novel_id: 9,
                number: 2
            }
            .path(),
            "/chapter/9/2"
        );
    }

    #[test]
    fn asset_references_resolve_against_static_images() {
        let base = base();
        assert_eq!(
            base.cover_url(Some("cover one.png")).as_deref(),
            Some("https://saga.example.com/static/images/cover%20one.png")
        );
        assert_eq!(
            base.cover_url(Some("HTTPS://cdn.example.com/c.png")).as_deref(),
            Some("HTTPS://cdn.example.com/c.png")
        );
        assert_eq!(base.cover_url(Some("  ")), None);
        assert_eq!(
            base.profile_photo_url(Some("data:image/png;base64,AAAA")).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(base.profile_photo_url(None), None);
    }
}
