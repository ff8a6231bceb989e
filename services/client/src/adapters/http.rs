//! services/client/src/adapters/http.rs
//!
//! This module contains the HTTP adapter, which is the concrete implementation
//! of the `NovelBackend` port from the `core` crate. Every call is a single
//! attempt: no retry, no caching and no timeout.

use crate::adapters::wire::{
    ChapterPayload, LoginBody, LoginPayload, MessageBody, NovelDetailsPayload, NovelListPayload,
    ProfileUpdateBody, ProfileUpdatePayload, RatingBody, RegisterBody, ReviewBody,
    ReviewListPayload, StatsRecord, UserListPayload, UserRecord,
};
use crate::config::Config;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use scroll_saga_core::domain::{
    Chapter, Credentials, LoginOutcome, Novel, NovelDetails, NovelId, NovelStats, PhotoUpload,
    ProfileUpdate, ProfileUpdateOutcome, Rating, Registration, Review, Session, UserId,
    UserProfile,
};
use scroll_saga_core::endpoints::{ApiBase, Endpoint, IDENTITY_HEADER};
use scroll_saga_core::ports::{NovelBackend, PortError, PortResult};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

//=========================================================================================
// Request Headers
//=========================================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderOptions {
    pub include_identity: bool,
}

/// Copies `base` and, when asked and a session exists, adds the identity header.
///
/// A missing session is not an error here; callers that need an identity check
/// for it before building the request.
pub fn build_headers(
    base: HeaderMap,
    session: Option<&Session>,
    options: HeaderOptions,
) -> HeaderMap {
    let mut headers = base;
    if options.include_identity {
        if let Some(session) = session {
            headers.insert(
                HeaderName::from_static(IDENTITY_HEADER),
                HeaderValue::from(session.user_id),
            );
        }
    }
    headers
}

fn json_accept() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn with_identity(session: Option<&Session>) -> HeaderMap {
    build_headers(
        json_accept(),
        session,
        HeaderOptions {
            include_identity: true,
        },
    )
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `NovelBackend` port over `reqwest`.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base: ApiBase,
}

impl HttpBackend {
    /// Creates a new `HttpBackend`.
    pub fn new(client: Client, base: ApiBase) -> Self {
        Self { client, base }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self::new(client, ApiBase::new(&config.api_base_url)))
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    fn get(&self, endpoint: &Endpoint<'_>, headers: HeaderMap) -> RequestBuilder {
        let url = self.base.url(endpoint);
        debug!(method = "GET", %url, "Backend request");
        self.client.get(url).headers(headers)
    }

    fn post(&self, endpoint: &Endpoint<'_>, headers: HeaderMap) -> RequestBuilder {
        let url = self.base.url(endpoint);
        debug!(method = "POST", %url, "Backend request");
        self.client.post(url).headers(headers)
    }

    /// Sends the request and turns non-success statuses into `PortError::Http`
    /// carrying the body's `message` (or `error`) when it parses as JSON.
    async fn execute(&self, request: RequestBuilder) -> PortResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageBody>(&body)
            .ok()
            .and_then(MessageBody::into_message);
        warn!(%url, status = status.as_u16(), ?message, "Backend rejected request");
        Err(PortError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = self.execute(request).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| PortError::Decode(e.to_string()))
    }

    /// For writes: success is the status; the body only contributes an optional message.
    async fn send_ack(&self, request: RequestBuilder) -> PortResult<Option<String>> {
        let response = self.execute(request).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice::<MessageBody>(&body)
            .ok()
            .and_then(MessageBody::into_message))
    }
}

fn transport_error(error: reqwest::Error) -> PortError {
    if error.is_decode() {
        PortError::Decode(error.to_string())
    } else if error.is_connect() || error.is_timeout() || error.is_request() || error.is_body() {
        PortError::Network(error.to_string())
    } else {
        PortError::Unexpected(error.to_string())
    }
}

fn photo_data_url(photo: &PhotoUpload) -> String {
    format!("data:{};base64,{}", photo.mime_type, STANDARD.encode(&photo.bytes))
}

//=========================================================================================
// `NovelBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl NovelBackend for HttpBackend {
    async fn list_novels(&self) -> PortResult<Vec<Novel>> {
        let payload: NovelListPayload = self
            .fetch_json(self.get(&Endpoint::Novels, json_accept()))
            .await?;
        Ok(payload.into_domain())
    }

    async fn search_novels(&self, query: &str) -> PortResult<Vec<Novel>> {
        let payload: NovelListPayload = self
            .fetch_json(self.get(&Endpoint::Search { query }, json_accept()))
            .await?;
        Ok(payload.into_domain())
    }

    async fn novel_details(&self, novel_id: NovelId, slug: &str) -> PortResult<NovelDetails> {
        let payload: NovelDetailsPayload = self
            .fetch_json(self.get(&Endpoint::NovelDetails { novel_id, slug }, json_accept()))
            .await?;
        Ok(payload.into_domain(novel_id))
    }

    async fn chapter(&self, novel_id: NovelId, number: u32) -> PortResult<Chapter> {
        let payload: ChapterPayload = self
            .fetch_json(self.get(&Endpoint::Chapter { novel_id, number }, json_accept()))
            .await?;
        Ok(payload.into_domain(novel_id, number))
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<LoginOutcome> {
        let body = LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        };
        let payload: LoginPayload = self
            .fetch_json(self.post(&Endpoint::Login, json_accept()).json(&body))
            .await?;
        let (user_id, username, message) = payload.into_parts();
        let user_id = user_id.ok_or_else(|| {
            PortError::Decode("login response did not include a user id".to_string())
        })?;
        Ok(LoginOutcome {
            user_id,
            username,
            message,
        })
    }

    async fn register(&self, registration: &Registration) -> PortResult<Option<String>> {
        let body = RegisterBody {
            username: &registration.username,
            email: &registration.email,
            password: &registration.password,
            confirm_password: &registration.confirm_password,
            bio: registration.bio.as_deref(),
            profile_photo: registration.profile_photo.as_ref().map(photo_data_url),
        };
        self.send_ack(self.post(&Endpoint::Register, json_accept()).json(&body))
            .await
    }

    async fn list_users(&self) -> PortResult<Vec<UserProfile>> {
        let payload: UserListPayload = self
            .fetch_json(self.get(&Endpoint::Users, json_accept()))
            .await?;
        Ok(payload.into_domain())
    }

    async fn user(&self, user_id: UserId) -> PortResult<UserProfile> {
        let record: UserRecord = self
            .fetch_json(self.get(&Endpoint::UserDetails { user_id }, json_accept()))
            .await?;
        record
            .to_domain()
            .ok_or_else(|| PortError::Decode("user record without an id".to_string()))
    }

    async fn own_profile(&self, session: &Session) -> PortResult<UserProfile> {
        let record: UserRecord = self
            .fetch_json(self.get(&Endpoint::Profile, with_identity(Some(session))))
            .await?;
        record
            .to_domain()
            .ok_or_else(|| PortError::Decode("profile record without an id".to_string()))
    }

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> PortResult<ProfileUpdateOutcome> {
        let body = ProfileUpdateBody {
            username: &update.username,
            email_address: &update.email,
            email: &update.email,
            user_bio: &update.bio,
            bio: &update.bio,
        };
        let url = self.base.url(&Endpoint::Profile);
        debug!(method = "PUT", %url, "Backend request");
        let request = self
            .client
            .put(url)
            .headers(with_identity(Some(session)))
            .json(&body);

        let response = self.execute(request).await?;
        let raw = response.bytes().await.map_err(transport_error)?;
        let (profile, message) = serde_json::from_slice::<ProfileUpdatePayload>(&raw)
            .map(ProfileUpdatePayload::into_parts)
            .unwrap_or((None, None));
        Ok(ProfileUpdateOutcome { profile, message })
    }

    async fn upload_profile_photo(
        &self,
        session: &Session,
        photo: &PhotoUpload,
    ) -> PortResult<Option<String>> {
        let part = Part::bytes(photo.bytes.to_vec())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.mime_type)
            .map_err(|e| PortError::InvalidInput(format!("Invalid image type: {}", e)))?;
        let form = Form::new()
            .text("user_id", session.user_id.to_string())
            .part("profile_photo", part);

        let headers = build_headers(
            HeaderMap::new(),
            Some(session),
            HeaderOptions {
                include_identity: true,
            },
        );
        self.send_ack(self.post(&Endpoint::ProfilePhoto, headers).multipart(form))
            .await
    }

    async fn booklist(&self, session: &Session) -> PortResult<Vec<Novel>> {
        let endpoint = Endpoint::MyBooklist {
            user_id: session.user_id,
        };
        let payload: NovelListPayload = self
            .fetch_json(self.get(&endpoint, with_identity(Some(session))))
            .await?;
        Ok(payload.into_domain())
    }

    async fn save_novel(&self, session: &Session, novel_id: NovelId) -> PortResult<Option<String>> {
        let request = self
            .post(&Endpoint::SaveNovel { novel_id }, with_identity(Some(session)))
            .json(&serde_json::json!({}));
        self.send_ack(request).await
    }

    async fn unsave_novel(
        &self,
        session: &Session,
        novel_id: NovelId,
    ) -> PortResult<Option<String>> {
        let request = self
            .post(&Endpoint::UnsaveNovel { novel_id }, with_identity(Some(session)))
            .json(&serde_json::json!({}));
        self.send_ack(request).await
    }

    async fn novel_stats(
        &self,
        novel_id: NovelId,
        session: Option<&Session>,
    ) -> PortResult<NovelStats> {
        let record: StatsRecord = self
            .fetch_json(self.get(&Endpoint::NovelStats { novel_id }, with_identity(session)))
            .await?;
        Ok(record.to_domain())
    }

    async fn track_view(&self, novel_id: NovelId, session: Option<&Session>) -> PortResult<()> {
        let request = self
            .post(&Endpoint::TrackNovelView { novel_id }, with_identity(session))
            .json(&serde_json::json!({}));
        self.send_ack(request).await.map(|_| ())
    }

    async fn rate_novel(
        &self,
        session: &Session,
        novel_id: NovelId,
        rating: Rating,
    ) -> PortResult<Option<String>> {
        let body = RatingBody {
            rating: rating.value(),
        };
        let request = self
            .post(&Endpoint::RateNovel { novel_id }, with_identity(Some(session)))
            .json(&body);
        self.send_ack(request).await
    }

    async fn reviews(&self, novel_id: NovelId) -> PortResult<Vec<Review>> {
        let payload: ReviewListPayload = self
            .fetch_json(self.get(&Endpoint::NovelReviews { novel_id }, json_accept()))
            .await?;
        Ok(payload.into_domain())
    }

    async fn post_review(
        &self,
        session: &Session,
        novel_id: NovelId,
        text: &str,
    ) -> PortResult<Option<String>> {
        let request = self
            .post(&Endpoint::NovelReviews { novel_id }, with_identity(Some(session)))
            .json(&ReviewBody { review_text: text });
        self.send_ack(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session() -> Session {
        Session {
            user_id: 42,
            username: "alice".to_string(),
            signed_in_at: Utc::now(),
        }
    }

    #[test]
    fn identity_header_is_added_only_when_requested() {
        let with = build_headers(
            json_accept(),
            Some(&session()),
            HeaderOptions {
                include_identity: true,
            },
        );
        assert_eq!(with.get(IDENTITY_HEADER).unwrap(), "42");
        assert_eq!(with.get(ACCEPT).unwrap(), "application/json");

        let without = build_headers(json_accept(), Some(&session()), HeaderOptions::default());
        assert!(without.get(IDENTITY_HEADER).is_none());
    }

    #[test]
    fn missing_session_leaves_headers_untouched() {
        let headers = build_headers(
            HeaderMap::new(),
            None,
            HeaderOptions {
                include_identity: true,
            },
        );
        assert!(headers.is_empty());
    }

    #[test]
    fn photo_is_sent_as_a_data_url() {
        let photo = PhotoUpload {
            file_name: "me.png".to_string(),
            mime_type: "image/png".to_string(),
            bytes: bytes::Bytes::from_static(b"png"),
        };
        assert_eq!(photo_data_url(&photo), "data:image/png;base64,cG5n");
    }
}
