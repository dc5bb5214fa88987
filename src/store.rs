// SPDX-License-Identifier: MIT

//! Persisted session store: the on-disk mirror of session data.
//!
//! One JSON file per key under a configurable directory. The mirror is
//! advisory — it exists only so a restart can resume the previous session;
//! the in-memory copy is authoritative while the process runs. Corrupt or
//! unreadable files are treated as absent. No schema versioning.

use crate::error::ApiError;
use crate::models::UserRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

/// Storage keys as constants.
pub mod keys {
    pub const TOKEN: &str = "auth_token";
    pub const USER: &str = "user";
    pub const THEME: &str = "theme";
    /// Whether the first-run loading screen has been shown this install.
    pub const INTRO_SHOWN: &str = "intro_shown";
}

/// File-backed key/value store for the session mirror.
///
/// Only the auth service writes the token/user keys.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Open (creating if needed) the store directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to create state dir {:?}: {}", dir, e))?;
        Ok(Self { dir })
    }

    pub fn token(&self) -> Option<String> {
        self.read(keys::TOKEN)
    }

    pub fn set_token(&self, token: &str) {
        self.write(keys::TOKEN, &token);
    }

    pub fn clear_token(&self) {
        self.remove(keys::TOKEN);
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.read(keys::USER)
    }

    pub fn set_user(&self, user: &UserRecord) {
        self.write(keys::USER, user);
    }

    pub fn clear_user(&self) {
        self.remove(keys::USER);
    }

    pub fn theme(&self) -> Option<String> {
        self.read(keys::THEME)
    }

    pub fn set_theme(&self, theme: &str) {
        self.write(keys::THEME, &theme);
    }

    pub fn intro_shown(&self) -> bool {
        self.read(keys::INTRO_SHOWN).unwrap_or(false)
    }

    pub fn set_intro_shown(&self, shown: bool) {
        self.write(keys::INTRO_SHOWN, &shown);
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read and deserialize a key; missing or corrupt files read as absent.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted key");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt persisted key, treating as absent");
                None
            }
        }
    }

    /// Serialize and write a key. The mirror is advisory, so failures are
    /// logged and swallowed rather than failing the operation that triggered
    /// the write.
    fn write<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to serialize persisted key");
                return;
            }
        };

        if let Err(e) = std::fs::write(self.path(key), payload) {
            tracing::warn!(key, error = %e, "Failed to write persisted key");
        }
    }

    /// Delete a key. Idempotent; removing an absent key is a no-op.
    fn remove(&self, key: &str) {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(key, error = %e, "Failed to remove persisted key"),
        }
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}
