use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use foresight_core::errors::{ForesightResult, StorageError};
use foresight_core::traits::IKeyValueStore;

/// Ephemeral string store with an optional byte quota.
///
/// Usage is counted as the byte length of every key plus its value.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: Option<usize>) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn used_bytes(&self) -> usize {
        usage(&self.lock())
    }
}

fn usage(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl IKeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> ForesightResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ForesightResult<()> {
        let mut items = self.lock();
        if let Some(quota) = self.quota_bytes {
            let current = usage(&items);
            let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
            let available = quota.saturating_sub(current - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                }
                .into());
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ForesightResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_keys_and_values() {
        let store = MemoryKeyValueStore::with_quota(Some(10));
        store.set_item("ab", "cdef").unwrap();
        assert_eq!(store.used_bytes(), 6);

        let err = store.set_item("gh", "ijk").unwrap_err();
        assert!(err.is_quota_exceeded());

        // Overwriting frees the old value first.
        store.set_item("ab", "cdefghij").unwrap();
        assert_eq!(store.used_bytes(), 10);
    }
}
