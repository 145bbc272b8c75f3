use crate::error::{ClientError, ClientResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the durable entry holding the bearer credential.
pub const TOKEN_KEY: &str = "token";

/// Opaque bearer token. An empty string is never a credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Durable client-side key-value storage.
pub trait CredentialStorage: Send + Sync {
    fn load(&self, key: &str) -> ClientResult<Option<String>>;
    fn store(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// One plain-text file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileCredentialStorage {
    root: PathBuf,
}

impl FileCredentialStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl CredentialStorage for FileCredentialStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ClientError::Storage(format!(
                "failed to read {key}: {err}"
            ))),
        }
    }

    fn store(&self, key: &str, value: &str) -> ClientResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.entry_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local storage. Clones share entries, so reopening a `TokenStore`
/// over a clone behaves like a restart over the same disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MemoryCredentialStorage {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Owner of the single active credential.
///
/// Storage is read once when the store is opened; after that the in-memory
/// value is authoritative. Clones are handles to the same credential.
#[derive(Clone)]
pub struct TokenStore {
    current: Arc<RwLock<Option<Credential>>>,
    storage: Arc<dyn CredentialStorage>,
}

impl TokenStore {
    pub fn open(storage: Arc<dyn CredentialStorage>) -> Self {
        let current = match storage.load(TOKEN_KEY) {
            Ok(raw) => raw.and_then(Credential::new),
            Err(err) => {
                warn!(%err, "failed to read persisted credential, starting signed out");
                None
            }
        };
        debug!(authenticated = current.is_some(), "token store opened");
        Self {
            current: Arc::new(RwLock::new(current)),
            storage,
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryCredentialStorage::new()))
    }

    pub fn get(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the credential. `None` signs out and removes the durable entry.
    pub fn set(&self, credential: Option<Credential>) -> ClientResult<()> {
        let persisted = match &credential {
            Some(value) => self.storage.store(TOKEN_KEY, value.as_str()),
            None => self.storage.remove(TOKEN_KEY),
        };
        info!(authenticated = credential.is_some(), "credential updated");
        *self.current.write() = credential;
        persisted
    }

    pub fn clear(&self) -> ClientResult<()> {
        self.set(None)
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
