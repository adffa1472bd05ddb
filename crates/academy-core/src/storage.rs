use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::{io, paths};

// ─── StorageKey ───────────────────────────────────────────────────────────

/// The fixed set of values the client keeps between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Token,
    RefreshToken,
    User,
    Profile,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Token,
        StorageKey::RefreshToken,
        StorageKey::User,
        StorageKey::Profile,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            StorageKey::Token => paths::TOKEN_FILE,
            StorageKey::RefreshToken => paths::REFRESH_TOKEN_FILE,
            StorageKey::User => paths::USER_FILE,
            StorageKey::Profile => paths::PROFILE_FILE,
        }
    }
}

// ─── SessionStorage ───────────────────────────────────────────────────────

/// Durable client-side storage for the signed-in session.
///
/// Each [`StorageKey`] maps to one file under `<state_dir>/session/`. The
/// credential files hold a bare string; the user and profile files hold JSON.
/// Everything is cleared together on logout or when the server rejects the
/// credential.
///
/// ```rust,ignore
/// let storage = SessionStorage::new(&state_dir);
/// storage.set_token("eyJhbGciOi...")?;
/// assert!(storage.token().is_some());
/// storage.clear()?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionStorage {
    dir: PathBuf,
}

impl SessionStorage {
    /// Session files live at `<state_dir>/session/`. The directory is created
    /// lazily on the first write.
    pub fn new(state_dir: &Path) -> Self {
        SessionStorage {
            dir: paths::session_dir(state_dir),
        }
    }

    /// The stored credential, or `None` when absent or blank.
    pub fn token(&self) -> Option<String> {
        self.load_text(StorageKey::Token)
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.save_text(StorageKey::Token, token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.load_text(StorageKey::RefreshToken)
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.save_text(StorageKey::RefreshToken, token)
    }

    /// Load a JSON value. A missing file is `Ok(None)`; a corrupt one is an error.
    pub fn load_json<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>> {
        let path = self.path(key);
        let data = match std::fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    pub fn save_json<T: Serialize>(&self, key: StorageKey, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        io::atomic_write(&self.path(key), &data)
    }

    /// Delete one key (no-op if absent).
    pub fn remove(&self, key: StorageKey) -> Result<()> {
        io::remove_if_exists(&self.path(key))?;
        Ok(())
    }

    /// Delete every stored key.
    pub fn clear(&self) -> Result<()> {
        for key in StorageKey::ALL {
            self.remove(key)?;
        }
        tracing::debug!(dir = %self.dir.display(), "session storage cleared");
        Ok(())
    }

    fn load_text(&self, key: StorageKey) -> Option<String> {
        std::fs::read_to_string(self.path(key))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
    }

    fn save_text(&self, key: StorageKey, value: &str) -> Result<()> {
        io::atomic_write(&self.path(key), value.as_bytes())
    }

    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn storage() -> (SessionStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = SessionStorage::new(dir.path());
        (storage, dir)
    }

    #[test]
    fn token_is_none_when_no_file() {
        let (storage, _dir) = storage();
        assert_eq!(storage.token(), None);
    }

    #[test]
    fn token_save_and_load() {
        let (storage, _dir) = storage();
        storage.set_token("tok-123").unwrap();
        assert_eq!(storage.token(), Some("tok-123".into()));
    }

    #[test]
    fn token_trims_and_ignores_blank() {
        let (storage, _dir) = storage();
        storage.set_token("tok\n").unwrap();
        assert_eq!(storage.token(), Some("tok".into()));
        storage.set_token("   ").unwrap();
        assert_eq!(storage.token(), None);
    }

    #[test]
    fn json_missing_is_none() {
        let (storage, _dir) = storage();
        let value: Option<serde_json::Value> = storage.load_json(StorageKey::Profile).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn json_corrupt_is_error() {
        let (storage, dir) = storage();
        let path = paths::session_dir(dir.path()).join(paths::USER_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();
        let loaded: Result<Option<serde_json::Value>> = storage.load_json(StorageKey::User);
        assert!(loaded.is_err());
    }

    #[test]
    fn json_save_and_load() {
        let (storage, _dir) = storage();
        storage
            .save_json(StorageKey::User, &json!({"id": 7, "email": "a@b.c"}))
            .unwrap();
        let loaded: serde_json::Value = storage.load_json(StorageKey::User).unwrap().unwrap();
        assert_eq!(loaded["id"], 7);
    }

    #[test]
    fn clear_removes_every_key() {
        let (storage, _dir) = storage();
        storage.set_token("a").unwrap();
        storage.set_refresh_token("b").unwrap();
        storage.save_json(StorageKey::User, &json!({})).unwrap();
        storage.save_json(StorageKey::Profile, &json!({})).unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.token(), None);
        assert_eq!(storage.refresh_token(), None);
        let profile: Option<serde_json::Value> = storage.load_json(StorageKey::Profile).unwrap();
        assert!(profile.is_none());
    }

    #[test]
    fn clear_is_noop_when_empty() {
        let (storage, _dir) = storage();
        storage.clear().unwrap();
    }

    #[test]
    fn remove_leaves_other_keys() {
        let (storage, _dir) = storage();
        storage.set_token("a").unwrap();
        storage.save_json(StorageKey::Profile, &json!({"x": 1})).unwrap();
        storage.remove(StorageKey::Profile).unwrap();
        assert_eq!(storage.token(), Some("a".into()));
    }
}
