//! Two-tier definition cache
//!
//! Memory first, persisted store behind it. Entries never expire; a failed
//! persisted write leaves the in-memory tier authoritative.

use super::{KeyValueStore, StorageError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Namespaced key for a word's cached definition
pub fn definition_key(word: &str) -> String {
    format!("ws_def_{}", word.to_lowercase())
}

pub struct DefinitionCache {
    memory: Mutex<HashMap<String, String>>,
    store: Arc<dyn KeyValueStore>,
}

impl DefinitionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Look up a definition, loading it from the persisted tier on first access.
    pub fn get(&self, word: &str) -> Option<String> {
        let key = definition_key(word);
        if let Some(def) = self.memory().get(&key) {
            return Some(def.clone());
        }

        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("definition cache read failed for {}: {}", key, e);
                return None;
            }
        };
        // Values are stored JSON-encoded
        let def = match serde_json::from_str::<String>(&raw) {
            Ok(def) if !def.is_empty() => def,
            _ => return None,
        };
        self.memory().insert(key, def.clone());
        Some(def)
    }

    /// Remember a definition in both tiers.
    pub fn put(&self, word: &str, definition: &str) {
        if definition.is_empty() {
            return;
        }
        let key = definition_key(word);
        self.memory().insert(key.clone(), definition.to_string());

        let persisted = serde_json::to_string(definition)
            .map_err(StorageError::from)
            .and_then(|encoded| self.store.put(&key, &encoded));
        if let Err(e) = persisted {
            log::warn!("definition cache write failed for {}: {}", key, e);
        }
    }

    /// Number of definitions held in memory.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.memory().len()
    }

    fn memory(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_FULL),
                None,
            )))
        }
    }

    #[test]
    fn test_put_then_get() {
        let cache = DefinitionCache::new(Arc::new(MemoryStore::new()));
        cache.put("Frog", "a tailless amphibian");
        assert_eq!(cache.get("frog").as_deref(), Some("a tailless amphibian"));
        assert_eq!(cache.get("FROG").as_deref(), Some("a tailless amphibian"));
    }

    #[test]
    fn test_writes_through_to_store() {
        let store = Arc::new(MemoryStore::new());
        let cache = DefinitionCache::new(store.clone());
        cache.put("frog", "a tailless amphibian");
        assert_eq!(
            store.get("ws_def_frog").unwrap().as_deref(),
            Some("\"a tailless amphibian\"")
        );
    }

    #[test]
    fn test_lazy_load_from_store() {
        let store = Arc::new(MemoryStore::new());
        store.put("ws_def_toad", "\"a warty amphibian\"").unwrap();
        let cache = DefinitionCache::new(store);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("toad").as_deref(), Some("a warty amphibian"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_and_corrupt_entries() {
        let store = Arc::new(MemoryStore::new());
        store.put("ws_def_newt", "not json").unwrap();
        store.put("ws_def_eft", "\"\"").unwrap();
        let cache = DefinitionCache::new(store);
        assert_eq!(cache.get("newt"), None);
        assert_eq!(cache.get("eft"), None);
        assert_eq!(cache.get("axolotl"), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let cache = DefinitionCache::new(Arc::new(FullStore));
        cache.put("frog", "a tailless amphibian");
        assert_eq!(cache.get("frog").as_deref(), Some("a tailless amphibian"));
    }

    #[test]
    fn test_empty_definition_not_cached() {
        let cache = DefinitionCache::new(Arc::new(MemoryStore::new()));
        cache.put("frog", "");
        assert_eq!(cache.get("frog"), None);
    }
}
