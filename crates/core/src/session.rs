//! Session storage.
//!
//! The session (bearer token, signed-in user, email awaiting verification) lives behind a
//! [`SessionStore`]. [`SessionHandle`] pairs a store with a broadcast channel so that an HTTP 401
//! anywhere can invalidate the session and notify whoever is listening.

use crate::{FolioError, FolioResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// The signed-in account, as returned by the auth endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Events published by [`SessionHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the stored credentials; the session has been cleared.
    Unauthorized,
}

/// Persistence for the current [`Session`].
pub trait SessionStore: Send + Sync {
    fn load(&self) -> FolioResult<Session>;
    fn save(&self, session: &Session) -> FolioResult<()>;
    fn clear(&self) -> FolioResult<()>;
}

/// Session kept as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    /// Missing files yield an empty session. So do unparsable ones, after a warning.
    fn load(&self) -> FolioResult<Session> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Session::default()),
            Err(e) => return Err(FolioError::SessionIo(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(Session::default())
            }
        }
    }

    fn save(&self, session: &Session) -> FolioResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(FolioError::SessionIo)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(FolioError::SessionFormat)?;
        fs::write(&self.path, json).map_err(FolioError::SessionIo)
    }

    fn clear(&self) -> FolioResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FolioError::SessionIo(e)),
        }
    }
}

/// Session held in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> FolioResult<Session> {
        Ok(self.lock().clone())
    }

    fn save(&self, session: &Session) -> FolioResult<()> {
        *self.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> FolioResult<()> {
        *self.lock() = Session::default();
        Ok(())
    }
}

/// Shared access to the session plus its event channel. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { store, events }
    }

    pub fn in_memory(session: Session) -> Self {
        Self::new(Arc::new(MemorySessionStore::new(session)))
    }

    pub fn current(&self) -> FolioResult<Session> {
        self.store.load()
    }

    /// Bearer token to attach to requests. Load failures are logged and treated as signed out.
    pub fn token(&self) -> Option<String> {
        match self.store.load() {
            Ok(session) => session.token.filter(|t| !t.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load session");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Stores a fresh token and user. A missing user clears the stored one.
    pub fn login(&self, token: impl Into<String>, user: Option<AuthUser>) -> FolioResult<()> {
        let mut session = self.store.load()?;
        session.token = Some(token.into());
        session.user = user;
        self.store.save(&session)
    }

    pub fn set_user(&self, user: AuthUser) -> FolioResult<()> {
        let mut session = self.store.load()?;
        session.user = Some(user);
        self.store.save(&session)
    }

    pub fn set_pending_email(&self, email: Option<String>) -> FolioResult<()> {
        let mut session = self.store.load()?;
        session.pending_email = email.filter(|e| !e.is_empty());
        self.store.save(&session)
    }

    pub fn logout(&self) -> FolioResult<()> {
        self.store.clear()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Clears the session after the server rejected it and notifies subscribers.
    pub fn invalidate(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear session");
        }
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::Unauthorized);
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}
