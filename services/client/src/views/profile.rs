//! Profile pages: viewing any user, editing your own, uploading a photo, and
//! the user directory.

use crate::events::ClientEvent;
use crate::state::ClientState;
use crate::views::{until_cancelled, ViewStatus};
use scroll_saga_core::domain::{PhotoUpload, ProfileUpdate, Session, UserId, UserProfile};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::ports::{PortError, PortResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const PROFILE_FALLBACK: &str = "User not found.";
const UPDATE_FALLBACK: &str = "Unable to update your profile. Please refresh and try again.";
const UPDATE_DEFAULT: &str = "Profile updated successfully.";
const PHOTO_FALLBACK: &str = "Unable to upload profile photo. Please refresh and try again.";
const PHOTO_DEFAULT: &str = "Profile photo updated.";
const USERS_FALLBACK: &str = "Unable to load users. Please refresh and try again.";

#[derive(Debug, Clone, Default)]
pub struct ProfileModel {
    pub profile: Option<UserProfile>,
    /// Absolute URL of the profile photo, when there is one.
    pub photo_url: Option<String>,
    pub status: ViewStatus,
    pub edit_status: ViewStatus,
    pub photo_status: ViewStatus,
}

#[derive(Clone)]
pub struct ProfileView {
    state: ClientState,
    user_id: UserId,
    model: Arc<RwLock<ProfileModel>>,
}

impl ProfileView {
    pub fn new(state: ClientState, user_id: UserId) -> Self {
        Self {
            state,
            user_id,
            model: Arc::new(RwLock::new(ProfileModel::default())),
        }
    }

    pub async fn snapshot(&self) -> ProfileModel {
        self.model.read().await.clone()
    }

    pub fn is_own_profile(&self) -> bool {
        self.state
            .session
            .current()
            .is_some_and(|session| session.user_id == self.user_id)
    }

    /// Loads the profile: the own-profile endpoint with identity when it is
    /// ours, the public user endpoint otherwise.
    pub async fn load(&self, cancel: &CancellationToken) -> PortResult<UserProfile> {
        self.model.write().await.status.begin();

        let backend = &self.state.backend;
        let own_session = self
            .state
            .session
            .current()
            .filter(|session| session.user_id == self.user_id);
        let result = match own_session {
            Some(session) => until_cancelled(cancel, backend.own_profile(&session)).await,
            None => until_cancelled(cancel, backend.user(self.user_id)).await,
        };

        let mut model = self.model.write().await;
        match result {
            Ok(profile) => {
                model.photo_url = self
                    .state
                    .base
                    .profile_photo_url(profile.profile_photo.as_deref());
                model.profile = Some(profile.clone());
                model.status.succeed(None);
                Ok(profile)
            }
            Err(PortError::Cancelled) => {
                model.status.abandon();
                Err(PortError::Cancelled)
            }
            Err(e) => {
                warn!(user_id = self.user_id, error = %e, "Failed to load profile");
                model.profile = None;
                model.photo_url = None;
                model.status.fail(user_message(&e, PROFILE_FALLBACK));
                Err(e)
            }
        }
    }

    /// Saves username, email and bio. On success the stored username follows
    /// the new one and `ProfileUpdated` is broadcast.
    pub async fn update(
        &self,
        update: ProfileUpdate,
        cancel: &CancellationToken,
    ) -> PortResult<UserProfile> {
        let update = ProfileUpdate {
            username: update.username.trim().to_string(),
            email: update.email.trim().to_string(),
            bio: update.bio.trim().to_string(),
        };
        let session = {
            let mut model = self.model.write().await;
            let session = match self.own_session("You can only edit your own profile.") {
                Ok(session) => session,
                Err(e) => return Err(model.edit_status.reject(e)),
            };
            if update.username.is_empty() || update.email.is_empty() {
                return Err(model.edit_status.reject(PortError::InvalidInput(
                    "Username and email are required.".to_string(),
                )));
            }
            model.edit_status.begin();
            session
        };

        let result = until_cancelled(
            cancel,
            self.state.backend.update_profile(&session, &update),
        )
        .await;

        let mut model = self.model.write().await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(PortError::Cancelled) => {
                model.edit_status.abandon();
                return Err(PortError::Cancelled);
            }
            Err(e) => {
                warn!(user_id = self.user_id, error = %e, "Profile update failed");
                model.edit_status.fail(user_message(&e, UPDATE_FALLBACK));
                return Err(e);
            }
        };

        let profile = outcome.profile.unwrap_or_else(|| {
            let previous = model.profile.clone();
            UserProfile {
                user_id: self.user_id,
                username: update.username.clone(),
                email: update.email.clone(),
                bio: (!update.bio.is_empty()).then(|| update.bio.clone()),
                role: previous
                    .as_ref()
                    .map(|p| p.role.clone())
                    .unwrap_or_else(|| "user".to_string()),
                profile_photo: previous.and_then(|p| p.profile_photo),
            }
        });
        model.profile = Some(profile.clone());
        model
            .edit_status
            .succeed(Some(outcome.message.unwrap_or_else(|| UPDATE_DEFAULT.to_string())));
        drop(model);

        if let Err(e) = self.state.session.rename(&profile.username) {
            warn!(error = %e, "Could not sync the stored username");
        }
        self.state.events.publish(ClientEvent::ProfileUpdated {
            user_id: self.user_id,
        });
        info!(user_id = self.user_id, "Profile updated");
        Ok(profile)
    }

    /// Uploads a new profile photo, then reloads the profile so the new photo
    /// URL comes from the server.
    pub async fn upload_photo(
        &self,
        photo: Option<PhotoUpload>,
        cancel: &CancellationToken,
    ) -> PortResult<UserProfile> {
        let (session, photo) = {
            let mut model = self.model.write().await;
            let session = match self.own_session("You can only update your own profile photo.") {
                Ok(session) => session,
                Err(e) => return Err(model.photo_status.reject(e)),
            };
            let Some(photo) = photo.filter(|photo| !photo.bytes.is_empty()) else {
                return Err(model.photo_status.reject(PortError::InvalidInput(
                    "Choose an image file first.".to_string(),
                )));
            };
            if !photo.is_image() {
                return Err(model.photo_status.reject(PortError::InvalidInput(
                    "Please choose an image file.".to_string(),
                )));
            }
            model.photo_status.begin();
            (session, photo)
        };

        let result = until_cancelled(
            cancel,
            self.state.backend.upload_profile_photo(&session, &photo),
        )
        .await;
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                let mut model = self.model.write().await;
                if e == PortError::Cancelled {
                    model.photo_status.abandon();
                } else {
                    warn!(user_id = self.user_id, error = %e, "Photo upload failed");
                    model.photo_status.fail(user_message(&e, PHOTO_FALLBACK));
                }
                return Err(e);
            }
        };

        let reloaded = self.load(cancel).await;
        {
            let mut model = self.model.write().await;
            if reloaded == Err(PortError::Cancelled) {
                model.photo_status.abandon();
                return Err(PortError::Cancelled);
            }
            model
                .photo_status
                .succeed(Some(message.unwrap_or_else(|| PHOTO_DEFAULT.to_string())));
        }
        self.state.events.publish(ClientEvent::ProfileUpdated {
            user_id: self.user_id,
        });
        info!(user_id = self.user_id, "Profile photo uploaded");
        reloaded
    }

    fn own_session(&self, not_owner: &str) -> PortResult<Session> {
        let session = self.state.session.require()?;
        if session.user_id != self.user_id {
            return Err(PortError::InvalidInput(not_owner.to_string()));
        }
        Ok(session)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryModel {
    pub users: Vec<UserProfile>,
    pub status: ViewStatus,
}

/// The list of all registered users.
#[derive(Clone)]
pub struct UserDirectory {
    state: ClientState,
    model: Arc<RwLock<DirectoryModel>>,
}

impl UserDirectory {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            model: Arc::new(RwLock::new(DirectoryModel::default())),
        }
    }

    pub async fn snapshot(&self) -> DirectoryModel {
        self.model.read().await.clone()
    }

    pub async fn load(&self, cancel: &CancellationToken) -> PortResult<usize> {
        self.model.write().await.status.begin();
        let result = until_cancelled(cancel, self.state.backend.list_users()).await;

        let mut model = self.model.write().await;
        match result {
            Ok(users) => {
                model.users = users;
                model.status.succeed(None);
                Ok(model.users.len())
            }
            Err(PortError::Cancelled) => {
                model.status.abandon();
                Err(PortError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load users");
                model.status.fail(user_message(&e, USERS_FALLBACK));
                Err(e)
            }
        }
    }
}
