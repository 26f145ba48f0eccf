//! Session persistence in a local key-value store.
//!
//! A session is the pair (token, role) stored under two well-known keys. It
//! is written after a successful login, read at start-up, and removed on
//! logout. There is no client-side expiry.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bookshop_core::{RoleKind, Route, Screen, allows, can_edit, menu_for, start_route_for};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Keys used in the backing store.
pub mod keys {
    /// Authentication token returned by login.
    pub const TOKEN: &str = "user_token";

    /// Role name returned by login.
    pub const ROLE: &str = "user_role";
}

/// Errors that can occur when reading or writing the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage, the shape of a mobile preferences file.
pub trait KeyValueStore {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.set_many(&[(key, value)])
    }

    /// Write several values in one update.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError>;

    /// Remove several keys at once.
    ///
    /// # Errors
    ///
    /// Returns error if the backing storage cannot be written.
    fn remove(&self, keys: &[&str]) -> Result<(), SessionError>;
}

// =============================================================================
// File store
// =============================================================================

/// A JSON object on disk, one string value per key.
///
/// A missing file reads as empty. Writes go to a sibling temporary file that
/// is then renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let body = serde_json::to_string_pretty(values).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        let mut values = self.read_all()?;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&values)
    }

    fn remove(&self, keys: &[&str]) -> Result<(), SessionError> {
        let mut values = self.read_all()?;
        let before = values.len();
        for key in keys {
            values.remove(*key);
        }
        if values.len() == before {
            return Ok(());
        }
        self.write_all(&values)
    }
}

// =============================================================================
// Memory store
// =============================================================================

/// In-process store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    role: String,
}

impl Session {
    #[must_use]
    pub fn new(token: SecretString, role: impl Into<String>) -> Self {
        Self {
            token,
            role: role.into(),
        }
    }

    /// Bearer token for API calls.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Role name as returned by the server.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn role_kind(&self) -> RoleKind {
        RoleKind::classify(&self.role)
    }

    /// Navigation menu for this session's role.
    #[must_use]
    pub fn menu(&self) -> &'static [Screen] {
        menu_for(&self.role)
    }

    #[must_use]
    pub fn start_route(&self) -> Route {
        start_route_for(&self.role)
    }

    /// Whether `route` is in this session's menu.
    #[must_use]
    pub fn allows(&self, route: Route) -> bool {
        allows(&self.role, route)
    }

    /// Whether this role may mutate products and record sales.
    #[must_use]
    pub fn can_edit(&self) -> bool {
        can_edit(&self.role)
    }
}

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(Session),
}

impl SessionState {
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::LoggedOut => None,
            Self::LoggedIn(session) => Some(session),
        }
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn(_))
    }
}

/// Reads and writes the session through a [`KeyValueStore`].
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read the current state.
    ///
    /// A stored role means logged in. The token may be empty when the
    /// service issued none; requests then go out without a bearer header.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn load(&self) -> Result<SessionState, SessionError> {
        let Some(role) = self
            .store
            .get(keys::ROLE)?
            .filter(|r| !r.trim().is_empty())
        else {
            return Ok(SessionState::LoggedOut);
        };
        let token = self.store.get(keys::TOKEN)?.unwrap_or_default();
        Ok(SessionState::LoggedIn(Session::new(
            SecretString::from(token),
            role,
        )))
    }

    /// Persist a freshly authenticated session.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.store.set_many(&[
            (keys::TOKEN, session.token.expose_secret()),
            (keys::ROLE, &session.role),
        ])?;
        tracing::debug!(role = %session.role, "Session saved");
        Ok(())
    }

    /// Remove the token and role.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(&[keys::TOKEN, keys::ROLE])?;
        tracing::debug!("Session cleared");
        Ok(())
    }
}
