//! Session token storage.
//!
//! The console keeps exactly one piece of session state: the bearer token
//! returned by a successful login. It is read on every outgoing request and
//! on every guard check, so stores must be cheap to query and safe to share.
//!
//! - [`FileSessionStore`] persists the token as a small JSON file so the
//!   session survives restarts.
//! - [`MemorySessionStore`] keeps it in memory, for tests and throwaway runs.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Read/write/clear access to the stored token.
pub trait SessionStore: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<(), SessionError>;
    fn clear_token(&self) -> Result<(), SessionError>;

    fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

/// On-disk representation of the session.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Token store backed by a JSON file.
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

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Option<StoredSession> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get_token(&self) -> Option<String> {
        self.read()
            .map(|session| session.token)
            .filter(|token| !token.is_empty())
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        if token.is_empty() {
            return self.clear_token();
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(&StoredSession {
            token: token.to_string(),
            saved_at: Utc::now(),
        })?;

        // Write next to the target and rename so a crash never leaves half a file.
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut options = std::fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path).map_err(|e| self.io_error(e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| self.io_error(e))?;
        }
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "Session token saved");
        Ok(())
    }

    fn clear_token(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session token cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: &str) -> Result<(), SessionError> {
        *self.token.write() = if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        };
        Ok(())
    }

    fn clear_token(&self) -> Result<(), SessionError> {
        *self.token.write() = None;
        Ok(())
    }
}
