//! In-process backend used by tests and `OVERDESK_STORE=memory`.

use std::collections::BTreeMap;

use parking_lot::{Mutex, RwLock};

use super::{PreferenceStore, StoreError, StoreKey, StoreWrite};

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    /// Remaining key writes before the store starts failing; `None` is unlimited.
    write_budget: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail. Exercises store-failure paths.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.write_budget.lock() = if fail { Some(0) } else { None };
    }

    /// Allow `writes` more key writes, then fail. Each entry of a batch counts
    /// as one write, so a batch can be cut off part way through.
    pub fn fail_after_writes(&self, writes: usize) {
        *self.write_budget.lock() = Some(writes);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn take_write(&self) -> Result<(), StoreError> {
        let mut budget = self.write_budget.lock();
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => Err(StoreError::Unavailable("memory store is read-only".into())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key.as_str()).cloned())
    }

    fn put(&self, key: &StoreKey, value: &str) -> Result<(), StoreError> {
        self.take_write()?;
        self.entries
            .write()
            .insert(key.as_str().to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.take_write()?;
        self.entries.write().remove(key.as_str());
        Ok(())
    }

    fn apply(&self, batch: &[StoreWrite]) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        let mut staged = entries.clone();
        for write in batch {
            self.take_write()?;
            match write {
                StoreWrite::Put(key, value) => {
                    staged.insert(key.as_str().to_string(), value.clone());
                }
                StoreWrite::Remove(key) => {
                    staged.remove(key.as_str());
                }
            }
        }
        *entries = staged;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<StoreKey>, StoreError> {
        self.entries
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .map(|k| StoreKey::parse(k))
            .collect()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
