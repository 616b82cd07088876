//! Persistent preference store.
//!
//! A flat key/value namespace holding JSON documents. Keys are built through
//! `StoreKey`, which only produces `shell/<name>` or `module/<id>/<name>`, so a
//! module can never address another module's keys through `ScopedStore`.

pub mod file;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::errors::{ERR_STORE_DB, ERR_STORE_IO, ERR_STORE_NAMESPACE, ERR_STORE_SERDE};
use crate::config::paths::{KEY_SEPARATOR, LAYOUT_VERSION, MODULE_NAMESPACE, SHELL_NAMESPACE};
use crate::config::{ShellConfig, StoreBackend};
use crate::registry::ModuleId;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("E-OVD-0100: store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("E-OVD-0101: store database error: {0}")]
    Database(String),
    #[error("E-OVD-0102: value (de)serialization failed: {0}")]
    Serde(String),
    #[error("E-OVD-0103: invalid store key '{0}'")]
    InvalidKey(String),
    #[error("E-OVD-0101: store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Io(_) => ERR_STORE_IO,
            StoreError::Database(_) | StoreError::Unavailable(_) => ERR_STORE_DB,
            StoreError::Serde(_) => ERR_STORE_SERDE,
            StoreError::InvalidKey(_) => ERR_STORE_NAMESPACE,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Fully-qualified key inside the preference store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn shell(name: &str) -> Result<Self, StoreError> {
        validate_segment(name)?;
        Ok(Self(format!("{SHELL_NAMESPACE}{KEY_SEPARATOR}{name}")))
    }

    pub fn module(id: &ModuleId, name: &str) -> Result<Self, StoreError> {
        validate_segment(id.as_str())?;
        validate_segment(name)?;
        Ok(Self(format!(
            "{MODULE_NAMESPACE}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}{name}"
        )))
    }

    /// Re-validate a raw key read back from a backend.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let parts: Vec<&str> = raw.split(KEY_SEPARATOR).collect();
        match parts.as_slice() {
            [ns, name] if *ns == SHELL_NAMESPACE => Self::shell(name),
            [ns, id, name] if *ns == MODULE_NAMESPACE => Self::module(&ModuleId::from(*id), name),
            _ => Err(StoreError::InvalidKey(raw.to_string())),
        }
    }

    pub fn module_prefix(id: &ModuleId) -> String {
        format!("{MODULE_NAMESPACE}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment (the name within its namespace).
    pub fn name(&self) -> &str {
        self.0.rsplit(KEY_SEPARATOR).next().unwrap_or(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let ok = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(segment.to_string()))
    }
}

/// One entry of a write batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Put(StoreKey, String),
    Remove(StoreKey),
}

/// Backend contract. Values are JSON text; writes are synchronous and durable
/// once the call returns.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError>;
    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &StoreKey) -> Result<(), StoreError>;
    /// Apply every write or none of them.
    fn apply(&self, batch: &[StoreWrite]) -> Result<(), StoreError>;
    /// Keys whose raw form starts with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<StoreKey>, StoreError>;
    fn backend_name(&self) -> &'static str;
}

pub type SharedStore = Arc<dyn PreferenceStore>;

/// Open the backend selected by `config`.
pub fn open_store(config: &ShellConfig) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.sqlite_path())?),
        StoreBackend::JsonFile => Arc::new(JsonFileStore::open(&config.json_store_path())?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    tracing::info!(target = "overdesk", backend = store.backend_name(), "preference store opened");
    Ok(store)
}

/// Read and decode a JSON value. Malformed documents are reported as `Serde`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn PreferenceStore,
    key: &StoreKey,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn PreferenceStore,
    key: &StoreKey,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.put(key, &raw)
}

/// Module-private view of the store; every key lands under `module/<id>/`.
#[derive(Clone)]
pub struct ScopedStore {
    store: SharedStore,
    module: ModuleId,
}

impl ScopedStore {
    pub fn new(store: SharedStore, module: ModuleId) -> Self {
        Self { store, module }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        load_json(self.store.as_ref(), &StoreKey::module(&self.module, name)?)
    }

    /// Like `get`, but a malformed stored document degrades to `T::default()`.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T, StoreError> {
        match self.get(name) {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(StoreError::Serde(reason)) => {
                tracing::warn!(
                    target = "overdesk",
                    module = %self.module,
                    key = name,
                    %reason,
                    "malformed module state, using defaults"
                );
                Ok(T::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn put<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), &StoreKey::module(&self.module, name)?, value)
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.store.remove(&StoreKey::module(&self.module, name)?)
    }

    /// Names of the keys this module currently owns.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let keys = self
            .store
            .keys_with_prefix(&StoreKey::module_prefix(&self.module))?;
        Ok(keys.iter().map(|k| k.name().to_string()).collect())
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    layout_version: String,
    value: T,
}

/// Shell-owned keys. Values are wrapped in a versioned envelope; a missing,
/// stale or malformed envelope reads as `None`.
#[derive(Clone)]
pub struct ShellStore {
    store: SharedStore,
}

impl ShellStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let key = StoreKey::shell(name)?;
        let envelope: Envelope<T> = match load_json(self.store.as_ref(), &key) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Ok(None),
            Err(StoreError::Serde(reason)) => {
                tracing::warn!(target = "overdesk", key = name, %reason, "malformed shell value, using defaults");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        if envelope.layout_version != LAYOUT_VERSION {
            tracing::info!(
                target = "overdesk",
                key = name,
                found = %envelope.layout_version,
                expected = LAYOUT_VERSION,
                "stale shell layout, using defaults"
            );
            return Ok(None);
        }
        Ok(Some(envelope.value))
    }

    /// Persist a batch built with `ShellBatch` in one atomic backend write.
    pub fn commit(&self, batch: ShellBatch) -> Result<(), StoreError> {
        self.store.apply(&batch.writes)
    }
}

/// Shell writes staged for a single `ShellStore::commit`. Values are encoded
/// when staged, so a serialization error surfaces before anything is written.
#[derive(Debug, Default)]
pub struct ShellBatch {
    writes: Vec<StoreWrite>,
}

impl ShellBatch {
    pub fn save<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), StoreError> {
        let key = StoreKey::shell(name)?;
        let envelope = Envelope {
            layout_version: LAYOUT_VERSION.to_string(),
            value,
        };
        self.writes.push(StoreWrite::Put(key, serde_json::to_string(&envelope)?));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<(), StoreError> {
        self.writes.push(StoreWrite::Remove(StoreKey::shell(name)?));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
