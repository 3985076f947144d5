use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use foresight_core::errors::ForesightResult;
use foresight_core::traits::IKeyValueStore;

use super::{EntryInfo, ICacheBackend};
use crate::StoredEntry;

/// Entries as JSON strings in a persistent key/value store.
///
/// Keys are namespaced with `prefix` so the store can be shared. Access
/// recency is tracked in-process only; entries inherited from an earlier
/// session count as least recently used.
pub struct KeyValueBackend {
    store: Arc<dyn IKeyValueStore>,
    prefix: String,
    access: Mutex<HashMap<String, u64>>,
    tick: AtomicU64,
}

impl KeyValueBackend {
    pub fn new(store: Arc<dyn IKeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            access: Mutex::new(HashMap::new()),
            tick: AtomicU64::new(0),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn access(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.access.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn touch(&self, key: &str) {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        self.access().insert(key.to_string(), tick);
    }

    /// Read and parse one entry. Unreadable entries are removed.
    fn read(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        let storage_key = self.storage_key(key);
        let Some(raw) = self.store.get_item(&storage_key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredEntry>(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key, error = %e, "removing unreadable cache entry");
                self.store.remove_item(&storage_key)?;
                self.access().remove(key);
                Ok(None)
            }
        }
    }
}

impl ICacheBackend for KeyValueBackend {
    fn name(&self) -> &'static str {
        "key_value"
    }

    fn get(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        let entry = self.read(key)?;
        if entry.is_some() {
            self.touch(key);
        }
        Ok(entry)
    }

    fn peek(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        self.read(key)
    }

    fn set(&self, key: &str, entry: StoredEntry) -> ForesightResult<()> {
        let raw = serde_json::to_string(&entry)?;
        self.store.set_item(&self.storage_key(key), &raw)?;
        self.touch(key);
        Ok(())
    }

    fn delete(&self, key: &str) -> ForesightResult<bool> {
        let storage_key = self.storage_key(key);
        let existed = self.store.get_item(&storage_key)?.is_some();
        self.store.remove_item(&storage_key)?;
        self.access().remove(key);
        Ok(existed)
    }

    fn clear(&self) -> ForesightResult<()> {
        for key in self.keys()? {
            self.store.remove_item(&self.storage_key(&key))?;
        }
        self.access().clear();
        Ok(())
    }

    fn size(&self) -> ForesightResult<usize> {
        Ok(self.keys()?.len())
    }

    fn contains(&self, key: &str) -> ForesightResult<bool> {
        Ok(self.store.get_item(&self.storage_key(key))?.is_some())
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect())
    }

    fn scan(&self) -> ForesightResult<Vec<EntryInfo>> {
        let mut infos = Vec::new();
        for key in self.keys()? {
            if let Some(entry) = self.read(&key)? {
                let last_access = self.access().get(&key).copied().unwrap_or(0);
                infos.push(EntryInfo::from_entry(&key, &entry, last_access));
            }
        }
        Ok(infos)
    }
}
