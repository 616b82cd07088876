//! Single JSON document backend (`overdesk-data.json`).
//!
//! The whole map is rewritten on every mutation through a temp file + rename so
//! a crash mid-write leaves the previous document intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{PreferenceStore, StoreError, StoreKey, StoreWrite};

pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
                Ok(doc) => doc
                    .into_iter()
                    .filter(|(k, _)| StoreKey::parse(k).is_ok())
                    .map(|(k, v)| (k, v.to_string()))
                    .collect(),
                Err(err) => {
                    let quarantine = path.with_extension("json.corrupt");
                    tracing::warn!(
                        target = "overdesk",
                        path = %path.display(),
                        error = %err,
                        quarantine = %quarantine.display(),
                        "store document is malformed, starting empty"
                    );
                    std::fs::rename(path, &quarantine)?;
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let mut doc = serde_json::Map::with_capacity(entries.len());
        for (key, raw) in entries {
            doc.insert(key.clone(), serde_json::from_str(raw)?);
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(doc))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key.as_str()).cloned())
    }

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        // Values must be JSON so the document stays a plain object.
        serde_json::from_str::<serde_json::Value>(value)?;
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.as_str().to_string(), value.to_string());
        if let Err(err) = self.flush(&entries) {
            match previous {
                Some(prev) => entries.insert(key.as_str().to_string(), prev),
                None => entries.remove(key.as_str()),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let Some(previous) = entries.remove(key.as_str()) else {
            return Ok(());
        };
        if let Err(err) = self.flush(&entries) {
            entries.insert(key.as_str().to_string(), previous);
            return Err(err);
        }
        Ok(())
    }

    fn apply(&self, batch: &[StoreWrite]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock();
        let mut staged = entries.clone();
        for write in batch {
            match write {
                StoreWrite::Put(key, value) => {
                    serde_json::from_str::<serde_json::Value>(value)?;
                    staged.insert(key.as_str().to_string(), value.clone());
                }
                StoreWrite::Remove(key) => {
                    staged.remove(key.as_str());
                }
            }
        }
        self.flush(&staged)?;
        *entries = staged;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<StoreKey>, StoreError> {
        self.entries
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| StoreKey::parse(k))
            .collect()
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_json_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(&dir.path().join("overdesk-data.json")).unwrap();
        let key = StoreKey::shell("x").unwrap();
        assert!(matches!(store.put(&key, "not json"), Err(StoreError::Serde(_))));
        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn malformed_document_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overdesk-data.json");
        std::fs::write(&path, "{ truncated").unwrap();
        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.keys_with_prefix("").unwrap().is_empty());
        assert!(dir.path().join("overdesk-data.json.corrupt").exists());
    }

    #[test]
    fn batch_with_invalid_value_leaves_document_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overdesk-data.json");
        let store = JsonFileStore::open(&path).unwrap();
        let hidden = StoreKey::shell("hidden_modules").unwrap();
        store.put(&hidden, "[]").unwrap();

        let batch = [
            StoreWrite::Put(hidden.clone(), r#"["news"]"#.into()),
            StoreWrite::Put(StoreKey::shell("custom_presets").unwrap(), "not json".into()),
        ];
        assert!(store.apply(&batch).is_err());
        assert_eq!(store.get(&hidden).unwrap().as_deref(), Some("[]"));
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(&hidden).unwrap().as_deref(), Some("[]"));
    }
}
