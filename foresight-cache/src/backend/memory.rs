use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use foresight_core::errors::ForesightResult;

use super::{EntryInfo, ICacheBackend};
use crate::StoredEntry;

struct Slot {
    entry: StoredEntry,
    last_access: u64,
}

/// In-process map. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, Slot>>,
    tick: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl ICacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        let tick = self.next_tick();
        let mut slots = self.lock();
        Ok(slots.get_mut(key).map(|slot| {
            slot.last_access = tick;
            slot.entry.clone()
        }))
    }

    fn peek(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        Ok(self.lock().get(key).map(|slot| slot.entry.clone()))
    }

    fn set(&self, key: &str, entry: StoredEntry) -> ForesightResult<()> {
        let last_access = self.next_tick();
        self.lock().insert(key.to_string(), Slot { entry, last_access });
        Ok(())
    }

    fn delete(&self, key: &str) -> ForesightResult<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    fn clear(&self) -> ForesightResult<()> {
        self.lock().clear();
        Ok(())
    }

    fn size(&self) -> ForesightResult<usize> {
        Ok(self.lock().len())
    }

    fn contains(&self, key: &str) -> ForesightResult<bool> {
        Ok(self.lock().contains_key(key))
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn scan(&self) -> ForesightResult<Vec<EntryInfo>> {
        Ok(self
            .lock()
            .iter()
            .map(|(key, slot)| EntryInfo::from_entry(key, &slot.entry, slot.last_access))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use foresight_core::models::CacheEntry;

    fn entry(n: i64) -> StoredEntry {
        CacheEntry::new(serde_json::json!(n), "1", Utc::now(), Duration::minutes(5), None)
    }

    #[test]
    fn get_refreshes_recency_but_peek_does_not() {
        let backend = MemoryBackend::new();
        backend.set("a", entry(1)).unwrap();
        backend.set("b", entry(2)).unwrap();
        assert_eq!(backend.least_recently_used().unwrap().as_deref(), Some("a"));

        backend.peek("a").unwrap();
        assert_eq!(backend.least_recently_used().unwrap().as_deref(), Some("a"));

        backend.get("a").unwrap();
        assert_eq!(backend.least_recently_used().unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn delete_reports_removal() {
        let backend = MemoryBackend::new();
        backend.set("a", entry(1)).unwrap();
        assert!(backend.delete("a").unwrap());
        assert!(!backend.delete("a").unwrap());
        assert_eq!(backend.size().unwrap(), 0);
    }
}
