//! Auth session state and its durable storage.
//!
//! The session is a process-wide singleton holding the bearer token and the
//! logged-in username. Both travel together: a session either has full
//! credentials or it is anonymous, which is exactly the
//! `is_authenticated ⇔ token ∧ username` invariant.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::util::lock::{rw_read, rw_write};

use super::error::InfraError;

const SOURCE: &str = "infra::session";

/// The two durable entries: bearer token and canonical username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub username: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }
}

/// File-backed credential storage: a small JSON document at a configured
/// path, read once at startup and rewritten on login/logout.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read stored credentials. Absent or malformed storage yields `None`
    /// (the session starts anonymous rather than failing startup).
    pub fn load(&self) -> Option<Credentials> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read session storage");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Session storage is malformed; starting anonymous");
                None
            }
        }
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), InfraError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(credentials)
            .map_err(|err| InfraError::session_storage(err.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), InfraError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory session state, rehydrated from the store at construction.
pub struct AuthSession {
    state: RwLock<Option<Credentials>>,
    store: SessionStore,
}

impl AuthSession {
    /// Build the session by reading durable storage; absent or malformed
    /// storage starts anonymous.
    pub fn restore(store: SessionStore) -> Self {
        let state = store.load();
        if let Some(credentials) = &state {
            info!(username = %credentials.username, "Session rehydrated from storage");
        }
        Self {
            state: RwLock::new(state),
            store,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        rw_read(&self.state, SOURCE, "is_authenticated").is_some()
    }

    pub fn token(&self) -> Option<String> {
        rw_read(&self.state, SOURCE, "token")
            .as_ref()
            .map(|credentials| credentials.token.clone())
    }

    pub fn username(&self) -> Option<String> {
        rw_read(&self.state, SOURCE, "username")
            .as_ref()
            .map(|credentials| credentials.username.clone())
    }

    /// Store credentials and persist them. A persistence failure is logged
    /// and tolerated: the live session works, it just won't survive a
    /// restart.
    pub fn set_credentials(&self, credentials: Credentials) {
        if let Err(err) = self.store.save(&credentials) {
            warn!(error = %err, "Failed to persist session; it will not survive a restart");
        }
        *rw_write(&self.state, SOURCE, "set_credentials") = Some(credentials);
    }

    /// Drop the session and its durable storage.
    ///
    /// Returns `true` only for the call that actually ended a session, so
    /// concurrent 401 handlers collapse into one logout side effect.
    pub fn clear(&self) -> bool {
        {
            let mut state = rw_write(&self.state, SOURCE, "clear");
            if state.is_none() {
                return false;
            }
            *state = None;
        }
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "Failed to clear session storage");
        }
        info!("Session cleared");
        true
    }
}
