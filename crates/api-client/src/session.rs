//! Persisted sign-in state
//!
//! A session is an access token plus the serialized user profile, kept under
//! two fixed keys. Both keys present means signed in; anything else is treated
//! as signed out.

use crate::error::{ApiError, ApiResult};
use crate::models::User;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "fourmore_token";

/// Storage key for the serialized user profile
pub const USER_KEY: &str = "fourmore_user";

/// A signed-in session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Durable home for the session
pub trait TokenStorage: Send + Sync + Debug {
    /// The stored session, if both keys are present
    fn load(&self) -> ApiResult<Option<Session>>;

    /// Store both keys
    fn save(&self, session: &Session) -> ApiResult<()>;

    /// Remove both keys
    fn clear(&self) -> ApiResult<()>;
}

/// JSON file holding the two session keys
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/fourmore/session.json`
    pub fn default_path() -> ApiResult<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("fourmore").join("session.json"))
            .ok_or_else(|| ApiError::Storage("no platform data directory".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ApiResult<Map<String, Value>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) | Err(_) => {
                    warn!(path = %self.path.display(), "Session file is malformed, ignoring it");
                    Ok(Map::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(ApiError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("{}: {e}", parent.display())))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)
            .map_err(|e| ApiError::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> ApiResult<Option<Session>> {
        let entries = self.read_entries()?;
        let token = entries.get(TOKEN_KEY).and_then(Value::as_str);
        let user = entries.get(USER_KEY).and_then(Value::as_str);

        let (Some(token), Some(user)) = (token, user) else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(user) {
            Ok(user) => Ok(Some(Session {
                token: token.to_string(),
                user,
            })),
            Err(e) => {
                warn!(error = %e, "Stored user profile is unreadable, treating as signed out");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_string(), Value::String(session.token.clone()));
        entries.insert(
            USER_KEY.to_string(),
            Value::String(serde_json::to_string(&session.user)?),
        );
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), user = %session.user.username, "Session saved");
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        let had_token = entries.remove(TOKEN_KEY).is_some();
        let had_user = entries.remove(USER_KEY).is_some();
        if had_token || had_user {
            self.write_entries(&entries)?;
            debug!(path = %self.path.display(), "Session cleared");
        }
        Ok(())
    }
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    session: Mutex<Option<Session>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> ApiResult<Option<Session>> {
        Ok(self.session.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}
