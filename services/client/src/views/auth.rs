//! Login, registration and logout.

use crate::state::ClientState;
use crate::views::{until_cancelled, ViewStatus};
use scroll_saga_core::domain::{Credentials, Registration, Session};
use scroll_saga_core::messages::user_message;
use scroll_saga_core::ports::{PortError, PortResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOGIN_FALLBACK: &str = "Login failed";
const LOGIN_DEFAULT: &str = "Login successful!";
const REGISTER_FALLBACK: &str = "Registration failed";
const REGISTER_DEFAULT: &str = "Registration successful! You can now log in.";

#[derive(Clone)]
pub struct AuthFlow {
    state: ClientState,
    status: Arc<RwLock<ViewStatus>>,
}

impl AuthFlow {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            status: Arc::new(RwLock::new(ViewStatus::default())),
        }
    }

    pub async fn status(&self) -> ViewStatus {
        self.status.read().await.clone()
    }

    /// Signs in and stores the session. The stored username is the one the
    /// server echoes, else the one typed.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> PortResult<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(self
                .status
                .write()
                .await
                .reject(PortError::InvalidInput("Both fields are required.".to_string())));
        }
        self.status.write().await.begin();

        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let result = until_cancelled(cancel, self.state.backend.login(&credentials)).await;

        let mut status = self.status.write().await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(PortError::Cancelled) => {
                status.abandon();
                return Err(PortError::Cancelled);
            }
            Err(e) => {
                warn!(username, error = %e, "Login failed");
                status.fail(user_message(&e, LOGIN_FALLBACK));
                return Err(e);
            }
        };

        let stored_name = outcome
            .username
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(username);
        let session = match self.state.session.set_session(outcome.user_id, stored_name) {
            Ok(session) => session,
            Err(e) => {
                status.fail(user_message(&e, LOGIN_FALLBACK));
                return Err(e);
            }
        };
        status.succeed(Some(
            outcome.message.unwrap_or_else(|| LOGIN_DEFAULT.to_string()),
        ));
        info!(user_id = session.user_id, "Logged in");
        Ok(session)
    }

    /// Creates an account. Does not sign in.
    pub async fn register(
        &self,
        registration: Registration,
        cancel: &CancellationToken,
    ) -> PortResult<String> {
        let registration = Registration {
            username: registration.username.trim().to_string(),
            email: registration.email.trim().to_string(),
            bio: registration
                .bio
                .map(|bio| bio.trim().to_string())
                .filter(|bio| !bio.is_empty()),
            ..registration
        };
        if let Err(e) = validate_registration(&registration) {
            return Err(self.status.write().await.reject(e));
        }
        self.status.write().await.begin();

        let result = until_cancelled(cancel, self.state.backend.register(&registration)).await;
        let mut status = self.status.write().await;
        match result {
            Ok(message) => {
                let message = message.unwrap_or_else(|| REGISTER_DEFAULT.to_string());
                status.succeed(Some(message.clone()));
                info!(username = %registration.username, "Registered");
                Ok(message)
            }
            Err(PortError::Cancelled) => {
                status.abandon();
                Err(PortError::Cancelled)
            }
            Err(e) => {
                warn!(username = %registration.username, error = %e, "Registration failed");
                status.fail(user_message(&e, REGISTER_FALLBACK));
                Err(e)
            }
        }
    }

    /// Clears the stored session. No request is made.
    pub async fn logout(&self) -> PortResult<()> {
        self.state.session.clear_session()?;
        *self.status.write().await = ViewStatus::default();
        Ok(())
    }
}

fn validate_registration(registration: &Registration) -> PortResult<()> {
    if registration.username.is_empty()
        || registration.email.is_empty()
        || registration.password.is_empty()
        || registration.confirm_password.is_empty()
    {
        return Err(PortError::InvalidInput("All fields are required.".to_string()));
    }
    if registration.password != registration.confirm_password {
        return Err(PortError::InvalidInput("Passwords do not match.".to_string()));
    }
    if let Some(photo) = &registration.profile_photo {
        if !photo.is_image() || photo.bytes.is_empty() {
            return Err(PortError::InvalidInput(
                "Invalid profile photo format. Please upload a valid image.".to_string(),
            ));
        }
    }
    Ok(())
}
