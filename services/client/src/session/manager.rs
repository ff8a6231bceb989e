//! services/client/src/session/manager.rs
//!
//! The single read/write/clear API over the stored session.
//!
//! The session lives in one versioned record. Keys written by older clients
//! (`loggedIn`, `userId`, `username`, `user`) are read once, migrated into the
//! record, and removed.

use crate::events::{ClientEvent, EventBus};
use chrono::{DateTime, Utc};
use scroll_saga_core::domain::{Session, UserId};
use scroll_saga_core::ports::{KeyValueStore, PortError, PortResult, StoreMutation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub const SESSION_KEY: &str = "scroll_saga.session";
pub const SESSION_VERSION: u32 = 1;

pub const LEGACY_LOGGED_IN_KEY: &str = "loggedIn";
pub const LEGACY_USER_ID_KEY: &str = "userId";
pub const LEGACY_USERNAME_KEY: &str = "username";
pub const LEGACY_USER_BLOB_KEY: &str = "user";

const LEGACY_KEYS: [&str; 4] = [
    LEGACY_LOGGED_IN_KEY,
    LEGACY_USER_ID_KEY,
    LEGACY_USERNAME_KEY,
    LEGACY_USER_BLOB_KEY,
];

//=========================================================================================
// Stored Record
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    version: u32,
    user_id: UserId,
    username: String,
    signed_in_at: DateTime<Utc>,
}

impl SessionRecord {
    fn from_session(session: &Session) -> Self {
        Self {
            version: SESSION_VERSION,
            user_id: session.user_id,
            username: session.username.clone(),
            signed_in_at: session.signed_in_at,
        }
    }

    fn to_domain(self) -> Session {
        Session {
            user_id: self.user_id,
            username: self.username,
            signed_in_at: self.signed_in_at,
        }
    }
}

/// The `user` blob older clients stored after login.
#[derive(Debug, Default, Deserialize)]
struct LegacyUserBlob {
    user_id: Option<serde_json::Value>,
    id: Option<serde_json::Value>,
    username: Option<String>,
}

fn legacy_id(value: &serde_json::Value) -> Option<UserId> {
    match value {
        serde_json::Value::Number(number) => number.as_u64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

//=========================================================================================
// Manager
//=========================================================================================

/// Owns the in-memory copy of the session and keeps it in step with the store.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    cached: RwLock<Option<Session>>,
    events: EventBus,
}

impl SessionManager {
    /// Creates a manager and loads whatever session the store already holds.
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> PortResult<Self> {
        let manager = Self {
            store,
            cached: RwLock::new(None),
            events,
        };
        let initial = manager.read_store()?;
        manager.replace_cache(initial);
        Ok(manager)
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The session as last read or written, without touching the store.
    pub fn current(&self) -> Option<Session> {
        match self.cached.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }

    /// The session, or `MissingIdentity` when nobody is signed in.
    pub fn require(&self) -> PortResult<Session> {
        self.current().ok_or(PortError::MissingIdentity)
    }

    /// Records a fresh login. Legacy keys are dropped in the same batch.
    pub fn set_session(&self, user_id: UserId, username: &str) -> PortResult<Session> {
        let session = Session {
            user_id,
            username: username.trim().to_string(),
            signed_in_at: Utc::now(),
        };
        self.write(&session)?;
        info!(user_id, username = %session.username, "Session started");
        self.commit(Some(session.clone()));
        Ok(session)
    }

    /// Reads the session from the store, migrating legacy keys if that is all there is.
    pub fn get_session(&self) -> PortResult<Option<Session>> {
        let session = self.read_store()?;
        self.replace_cache(session.clone());
        Ok(session)
    }

    /// Removes the record and every legacy key in one batch.
    pub fn clear_session(&self) -> PortResult<()> {
        let mut mutations = vec![StoreMutation::remove(SESSION_KEY)];
        mutations.extend(LEGACY_KEYS.iter().map(|key| StoreMutation::remove(key)));
        self.store.apply(&mutations)?;
        info!("Session cleared");
        self.commit(None);
        Ok(())
    }

    /// Keeps the stored username in step with a profile edit.
    pub fn rename(&self, username: &str) -> PortResult<Option<Session>> {
        let Some(mut session) = self.current() else {
            return Ok(None);
        };
        let username = username.trim();
        if username.is_empty() || username == session.username {
            return Ok(Some(session));
        }
        session.username = username.to_string();
        self.write(&session)?;
        self.commit(Some(session.clone()));
        Ok(Some(session))
    }

    /// Re-derives the session from the store, e.g. after navigation or after
    /// another handle wrote to it. Emits `SessionChanged` only on a difference.
    pub fn revalidate(&self) -> PortResult<Option<Session>> {
        let fresh = self.read_store()?;
        if fresh != self.current() {
            info!(logged_in = fresh.is_some(), "Session changed outside this handle");
            self.commit(fresh.clone());
        }
        Ok(fresh)
    }

    fn write(&self, session: &Session) -> PortResult<()> {
        let record = serde_json::to_string(&SessionRecord::from_session(session))
            .map_err(|e| PortError::Storage(e.to_string()))?;
        let mut mutations = vec![StoreMutation::set(SESSION_KEY, record)];
        mutations.extend(LEGACY_KEYS.iter().map(|key| StoreMutation::remove(key)));
        self.store.apply(&mutations)
    }

    fn commit(&self, session: Option<Session>) {
        self.replace_cache(session.clone());
        self.events.publish(ClientEvent::SessionChanged(session));
    }

    fn replace_cache(&self, session: Option<Session>) {
        match self.cached.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn read_store(&self) -> PortResult<Option<Session>> {
        if let Some(raw) = self.store.get(SESSION_KEY)? {
            match serde_json::from_str::<SessionRecord>(&raw) {
                Ok(record) if record.version == SESSION_VERSION => {
                    return Ok(Some(record.to_domain()))
                }
                Ok(record) => {
                    warn!(version = record.version, "Ignoring session record of unknown version");
                    return Ok(None);
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable session record");
                    return Ok(None);
                }
            }
        }
        self.migrate_legacy()
    }

    fn migrate_legacy(&self) -> PortResult<Option<Session>> {
        let flag = self
            .store
            .get(LEGACY_LOGGED_IN_KEY)?
            .is_some_and(|value| value.trim() == "true");
        let blob = self
            .store
            .get(LEGACY_USER_BLOB_KEY)?
            .map(|raw| serde_json::from_str::<LegacyUserBlob>(&raw).unwrap_or_default());

        if !flag && blob.is_none() {
            return Ok(None);
        }

        let blob = blob.unwrap_or_default();
        let user_id = self
            .store
            .get(LEGACY_USER_ID_KEY)?
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .or_else(|| blob.user_id.as_ref().and_then(legacy_id))
            .or_else(|| blob.id.as_ref().and_then(legacy_id));
        let Some(user_id) = user_id else {
            warn!("Legacy session is flagged as logged in but carries no user id");
            return Ok(None);
        };
        let username = self
            .store
            .get(LEGACY_USERNAME_KEY)?
            .filter(|name| !name.trim().is_empty())
            .or(blob.username)
            .unwrap_or_default();

        let session = Session {
            user_id,
            username: username.trim().to_string(),
            signed_in_at: Utc::now(),
        };
        self.write(&session)?;
        info!(user_id, "Migrated legacy session keys");
        Ok(Some(session))
    }
}
