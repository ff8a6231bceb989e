//! Common test utilities: an in-process fake backend that counts calls, and an
//! axum stub server for exercising the real HTTP adapter.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use client_lib::{adapters::MemoryStore, config::Config, state::ClientState};
use scroll_saga_core::domain::{
    Chapter, ChapterStub, Credentials, LoginOutcome, Novel, NovelDetails, NovelId, NovelStats,
    PhotoUpload, ProfileUpdate, ProfileUpdateOutcome, Rating, Registration, Review, Session,
    UserId, UserProfile,
};
use scroll_saga_core::ports::{NovelBackend, PortError, PortResult};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

//=========================================================================================
// Fake backend
//=========================================================================================

pub fn novel(id: NovelId, title: &str) -> Novel {
    Novel {
        id,
        title: title.to_string(),
        author: "Test Author".to_string(),
        description: format!("About {title}"),
        genre: Some("Fantasy".to_string()),
        cover_image: Some(format!("cover{id}.jpg")),
        published_at: None,
    }
}

pub fn stats_for(novel_id: NovelId, user_rating: Option<u8>) -> NovelStats {
    NovelStats {
        average_rating: 4.0,
        ratings_count: novel_id,
        view_count: novel_id * 10,
        unique_viewers: novel_id * 5,
        user_rating,
    }
}

/// Backend double with canned data. Every trait call is counted by name.
pub struct FakeBackend {
    calls: Mutex<HashMap<&'static str, usize>>,
    novels: Vec<Novel>,
    chapters: Vec<ChapterStub>,
    failing_stats: HashSet<NovelId>,
    search_delays: HashMap<String, Duration>,
    chapter_delays: HashMap<u32, Duration>,
    list_delay: Option<Duration>,
    unsave_status: Option<u16>,
    ratings: Mutex<HashMap<NovelId, u8>>,
    reviews: Mutex<Vec<Review>>,
    saved: Mutex<HashSet<NovelId>>,
    photo: Mutex<Option<String>>,
    login_username: Option<String>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            novels: vec![novel(1, "The Lost Scroll"), novel(2, "Dune"), novel(3, "Emberfall")],
            chapters: (1..=3)
                .map(|number| ChapterStub {
                    number,
                    name: format!("Chapter {number}"),
                })
                .collect(),
            failing_stats: HashSet::new(),
            search_delays: HashMap::new(),
            chapter_delays: HashMap::new(),
            list_delay: None,
            unsave_status: None,
            ratings: Mutex::new(HashMap::new()),
            reviews: Mutex::new(Vec::new()),
            saved: Mutex::new(HashSet::new()),
            photo: Mutex::new(None),
            login_username: None,
        }
    }

    pub fn with_failing_stats(mut self, novel_id: NovelId) -> Self {
        self.failing_stats.insert(novel_id);
        self
    }

    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    pub fn with_chapter_delay(mut self, number: u32, delay: Duration) -> Self {
        self.chapter_delays.insert(number, delay);
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_unsave_status(mut self, status: u16) -> Self {
        self.unsave_status = Some(status);
        self
    }

    pub fn with_rating(self, novel_id: NovelId, value: u8) -> Self {
        self.ratings.lock().unwrap().insert(novel_id, value);
        self
    }

    pub fn with_saved(self, novel_id: NovelId) -> Self {
        self.saved.lock().unwrap().insert(novel_id);
        self
    }

    pub fn with_login_username(mut self, username: &str) -> Self {
        self.login_username = Some(username.to_string());
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
    }

    fn find(&self, novel_id: NovelId) -> PortResult<Novel> {
        self.novels
            .iter()
            .find(|novel| novel.id == novel_id)
            .cloned()
            .ok_or(PortError::Http {
                status: 404,
                message: Some("Novel not found".to_string()),
            })
    }

    fn profile(&self, user_id: UserId) -> UserProfile {
        UserProfile {
            user_id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            bio: None,
            role: "user".to_string(),
            profile_photo: self.photo.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl NovelBackend for FakeBackend {
    async fn list_novels(&self) -> PortResult<Vec<Novel>> {
        self.record("list_novels");
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.novels.clone())
    }

    async fn search_novels(&self, query: &str) -> PortResult<Vec<Novel>> {
        self.record("search_novels");
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        let needle = query.trim().to_lowercase();
        Ok(self
            .novels
            .iter()
            .filter(|novel| novel.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn novel_details(&self, novel_id: NovelId, _slug: &str) -> PortResult<NovelDetails> {
        self.record("novel_details");
        Ok(NovelDetails {
            novel: self.find(novel_id)?,
            chapters: self.chapters.clone(),
            reviews: self.reviews.lock().unwrap().clone(),
        })
    }

    async fn chapter(&self, novel_id: NovelId, number: u32) -> PortResult<Chapter> {
        self.record("chapter");
        if let Some(delay) = self.chapter_delays.get(&number) {
            tokio::time::sleep(*delay).await;
        }
        Ok(Chapter {
            novel_id,
            number,
            name: format!("Chapter {number}"),
            content: format!("Text of chapter {number}"),
        })
    }

    async fn login(&self, credentials: &Credentials) -> PortResult<LoginOutcome> {
        self.record("login");
        if credentials.password != "secret" {
            return Err(PortError::Http {
                status: 401,
                message: Some("Invalid username or password".to_string()),
            });
        }
        Ok(LoginOutcome {
            user_id: 42,
            username: self.login_username.clone(),
            message: None,
        })
    }

    async fn register(&self, _registration: &Registration) -> PortResult<Option<String>> {
        self.record("register");
        Ok(Some("Registration successful!".to_string()))
    }

    async fn list_users(&self) -> PortResult<Vec<UserProfile>> {
        self.record("list_users");
        Ok(vec![self.profile(42), {
            let mut bob = self.profile(7);
            bob.username = "bob".to_string();
            bob
        }])
    }

    async fn user(&self, user_id: UserId) -> PortResult<UserProfile> {
        self.record("user");
        Ok(self.profile(user_id))
    }

    async fn own_profile(&self, session: &Session) -> PortResult<UserProfile> {
        self.record("own_profile");
        Ok(self.profile(session.user_id))
    }

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> PortResult<ProfileUpdateOutcome> {
        self.record("update_profile");
        let mut profile = self.profile(session.user_id);
        profile.username = update.username.clone();
        profile.email = update.email.clone();
        Ok(ProfileUpdateOutcome {
            profile: Some(profile),
            message: Some("Profile updated successfully.".to_string()),
        })
    }

    async fn upload_profile_photo(
        &self,
        _session: &Session,
        photo: &PhotoUpload,
    ) -> PortResult<Option<String>> {
        self.record("upload_profile_photo");
        *self.photo.lock().unwrap() = Some(photo.file_name.clone());
        Ok(None)
    }

    async fn booklist(&self, _session: &Session) -> PortResult<Vec<Novel>> {
        self.record("booklist");
        let saved = self.saved.lock().unwrap().clone();
        Ok(self
            .novels
            .iter()
            .filter(|novel| saved.contains(&novel.id))
            .cloned()
            .collect())
    }

    async fn save_novel(&self, _session: &Session, novel_id: NovelId) -> PortResult<Option<String>> {
        self.record("save_novel");
        self.saved.lock().unwrap().insert(novel_id);
        Ok(None)
    }

    async fn unsave_novel(
        &self,
        _session: &Session,
        novel_id: NovelId,
    ) -> PortResult<Option<String>> {
        self.record("unsave_novel");
        if let Some(status) = self.unsave_status {
            return Err(PortError::Http {
                status,
                message: Some("Unauthorized".to_string()),
            });
        }
        self.saved.lock().unwrap().remove(&novel_id);
        Ok(Some("Novel removed".to_string()))
    }

    async fn novel_stats(
        &self,
        novel_id: NovelId,
        session: Option<&Session>,
    ) -> PortResult<NovelStats> {
        self.record("novel_stats");
        if self.failing_stats.contains(&novel_id) {
            return Err(PortError::Http {
                status: 500,
                message: None,
            });
        }
        let user_rating = session.and_then(|_| self.ratings.lock().unwrap().get(&novel_id).copied());
        Ok(stats_for(novel_id, user_rating))
    }

    async fn track_view(&self, _novel_id: NovelId, _session: Option<&Session>) -> PortResult<()> {
        self.record("track_view");
        Ok(())
    }

    async fn rate_novel(
        &self,
        _session: &Session,
        novel_id: NovelId,
        rating: Rating,
    ) -> PortResult<Option<String>> {
        self.record("rate_novel");
        self.ratings.lock().unwrap().insert(novel_id, rating.value());
        Ok(Some("Rating saved".to_string()))
    }

    async fn reviews(&self, _novel_id: NovelId) -> PortResult<Vec<Review>> {
        self.record("reviews");
        Ok(self.reviews.lock().unwrap().clone())
    }

    async fn post_review(
        &self,
        session: &Session,
        _novel_id: NovelId,
        text: &str,
    ) -> PortResult<Option<String>> {
        self.record("post_review");
        let mut reviews = self.reviews.lock().unwrap();
        let id = reviews.len() as u64 + 1;
        reviews.push(Review {
            id: Some(id),
            author: session.username.clone(),
            text: text.to_string(),
            profile_photo: None,
            published_at: None,
        });
        Ok(Some("Review added".to_string()))
    }
}

/// Client state around `backend` with an in-memory session store.
pub fn fake_state(backend: Arc<FakeBackend>) -> ClientState {
    ClientState::with_parts(
        backend,
        Arc::new(MemoryStore::new()),
        Config::with_base_url("http://backend.test", PathBuf::from("unused-session.json")),
    )
    .unwrap()
}

pub fn logged_in_state(backend: Arc<FakeBackend>) -> ClientState {
    let state = fake_state(backend);
    state.session.set_session(42, "alice").unwrap();
    state
}

//=========================================================================================
// Stub HTTP server
//=========================================================================================

/// One request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub user_id_header: Option<String>,
}

#[derive(Clone, Default)]
struct StubState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

/// A small stand-in for the Scroll Saga backend on an ephemeral port.
pub struct StubServer {
    pub base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/login", post(login))
            .route("/api/search", get(search))
            .route("/api/my_booklist", get(booklist))
            .route("/api/save_novel/{id}", post(save))
            .route("/api/unsave_novel/{id}", post(unsave))
            .route("/api/novels/{id}/stats", get(stats))
            .route("/api/novels", get(novels))
            .route("/api/users", get(users))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            base_url: format!("http://{}/", addr),
            seen: state.seen,
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }
}

async fn record(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let seen = SeenRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        user_id_header: request
            .headers()
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    state.seen.lock().unwrap().push(seen);
    next.run(request).await
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["username"] == "alice" && body["password"] == "secret" {
        Json(json!({ "user_id": 42 })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid username or password" })),
        )
            .into_response()
    }
}

async fn novels() -> Json<Value> {
    Json(json!([
        { "novel_id": 7, "novel_title": "Dune", "author": "Frank Herbert", "summary": "Spice." },
        { "id": 8, "title": "Emberfall", "author": "A. Writer" }
    ]))
}

/// A proxy error page instead of a JSON body.
async fn users() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body><h1>500 Internal Server Error</h1></body></html>",
    )
        .into_response()
}

async fn search() -> Json<Value> {
    Json(json!([]))
}

async fn booklist() -> Json<Value> {
    Json(json!([
        { "novel_id": 7, "novel_title": "Dune", "author": "Frank Herbert" }
    ]))
}

async fn save(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "message": format!("Novel {id} saved") }))
}

async fn unsave(Path(_id): Path<u64>) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

async fn stats(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({
        "average_rating": 4.5,
        "ratings_count": id,
        "view_count": 120,
        "unique_viewers": 40,
        "user_rating": null
    }))
}
