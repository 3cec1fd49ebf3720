//! Authentication session and token persistence.
//!
//! # Design
//! The bearer token lives in an explicit `Session` value handed to the client
//! at construction. Nothing reads ambient global storage: a `TokenStore` is
//! consulted once by `Session::load`, and the client only ever sees the
//! resulting snapshot. After authenticating, the caller persists the new
//! session and builds a client around it.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{ApiError, StoreError};
use crate::types::RawObject;

/// Key under which the token is persisted.
pub const TOKEN_KEY: &str = "jwtToken";

/// Key of the token in the authentication response.
pub const TOKEN_FIELD: &str = "token";

/// Read-only view of the current authentication state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Extract the token from an authentication response.
    pub fn from_auth_response(response: &RawObject) -> Result<Self, ApiError> {
        match response.get(TOKEN_FIELD).and_then(|value| value.as_str()) {
            Some(token) if !token.is_empty() => Ok(Self::with_token(token)),
            _ => Err(ApiError::Decode(format!(
                "authentication response has no {TOKEN_FIELD:?} string"
            ))),
        }
    }

    /// Snapshot the token currently persisted in `store`.
    pub fn load(store: &dyn TokenStore) -> Result<Self, StoreError> {
        Ok(store
            .get(TOKEN_KEY)?
            .map(Self::with_token)
            .unwrap_or_default())
    }

    /// Persist this session's token, or clear it when anonymous.
    pub fn persist(&self, store: &dyn TokenStore) -> Result<(), StoreError> {
        match &self.token {
            Some(token) => store.set(TOKEN_KEY, token),
            None => store.remove(TOKEN_KEY),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Process-wide string key/value storage.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store, mostly for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk. A missing file reads as
/// empty; every write rewrites the whole file.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_token_is_anonymous() {
        assert!(!Session::with_token("").is_authenticated());
        assert!(Session::with_token("abc").is_authenticated());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", Session::with_token("secret"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn token_is_extracted_from_auth_response() {
        let response = json!({"token": "jwt.abc", "userID": "u1"});
        let session = Session::from_auth_response(response.as_object().unwrap()).unwrap();
        assert_eq!(session.token(), Some("jwt.abc"));
    }

    #[test]
    fn auth_response_without_token_is_a_decode_error() {
        let response = json!({"message": "unknown appleID"});
        let err = Session::from_auth_response(response.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryTokenStore::default();
        assert_eq!(Session::load(&store).unwrap(), Session::anonymous());

        Session::with_token("t1").persist(&store).unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert_eq!(Session::load(&store).unwrap().token(), Some("t1"));

        Session::anonymous().persist(&store).unwrap();
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("session.json");

        let store = FileTokenStore::new(&path);
        assert!(Session::load(&store).unwrap().token().is_none());
        Session::with_token("t2").persist(&store).unwrap();
        store.set("appleID", "apple.1").unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(Session::load(&reopened).unwrap().token(), Some("t2"));
        assert_eq!(reopened.get("appleID").unwrap().as_deref(), Some("apple.1"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileTokenStore::new(&path).get(TOKEN_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
