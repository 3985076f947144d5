//! Storage backends behind a single trait, picked by `create_backend`.

mod key_value;
mod memory;
mod sqlite;

pub use key_value::KeyValueBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use foresight_core::config::{CacheBackendKind, CacheConfig};
use foresight_core::errors::ForesightResult;
use foresight_core::traits::IKeyValueStore;

use crate::store::MemoryKeyValueStore;
use crate::StoredEntry;

/// Envelope fields of a stored entry, used for eviction and sweeping.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub version: String,
    /// Monotonic access stamp; higher is more recent.
    pub last_access: u64,
}

impl EntryInfo {
    pub fn from_entry(key: &str, entry: &StoredEntry, last_access: u64) -> Self {
        Self {
            key: key.to_string(),
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            version: entry.version.clone(),
            last_access,
        }
    }
}

/// A place to put cache entries. Policy lives in `TieredCache`.
///
/// `get` counts as an access for LRU purposes; `peek` does not.
pub trait ICacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> ForesightResult<Option<StoredEntry>>;
    fn peek(&self, key: &str) -> ForesightResult<Option<StoredEntry>>;
    fn set(&self, key: &str, entry: StoredEntry) -> ForesightResult<()>;
    /// Returns whether an entry was removed.
    fn delete(&self, key: &str) -> ForesightResult<bool>;
    fn clear(&self) -> ForesightResult<()>;
    fn size(&self) -> ForesightResult<usize>;
    fn contains(&self, key: &str) -> ForesightResult<bool>;
    fn keys(&self) -> ForesightResult<Vec<String>>;
    /// Envelope of every readable entry.
    fn scan(&self) -> ForesightResult<Vec<EntryInfo>>;

    fn least_recently_used(&self) -> ForesightResult<Option<String>> {
        Ok(self
            .scan()?
            .into_iter()
            .min_by(|a, b| a.last_access.cmp(&b.last_access).then_with(|| a.key.cmp(&b.key)))
            .map(|info| info.key))
    }

    /// Entry with the earliest creation time.
    fn oldest(&self) -> ForesightResult<Option<String>> {
        Ok(self
            .scan()?
            .into_iter()
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)))
            .map(|info| info.key))
    }

    fn earliest_expiry(&self) -> ForesightResult<Option<String>> {
        Ok(self
            .scan()?
            .into_iter()
            .min_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.key.cmp(&b.key)))
            .map(|info| info.key))
    }

    /// Some entry whose version differs from `version`.
    fn stale_version(&self, version: &str) -> ForesightResult<Option<String>> {
        Ok(self
            .scan()?
            .into_iter()
            .filter(|info| info.version != version)
            .min_by(|a, b| a.created_at.cmp(&b.created_at))
            .map(|info| info.key))
    }

    /// Whether calls block on I/O and must run on the blocking pool.
    fn is_blocking(&self) -> bool {
        false
    }
}

/// Build the backend named by `config.backend`.
///
/// `store` backs the key/value backend; without one an in-memory store with
/// the configured quota is used.
pub fn create_backend(
    config: &CacheConfig,
    store: Option<Arc<dyn IKeyValueStore>>,
) -> ForesightResult<Arc<dyn ICacheBackend>> {
    let backend: Arc<dyn ICacheBackend> = match config.backend {
        CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
        CacheBackendKind::KeyValue => {
            let store = store.unwrap_or_else(|| {
                Arc::new(MemoryKeyValueStore::with_quota(config.quota_bytes))
            });
            Arc::new(KeyValueBackend::new(store, config.key_prefix.clone()))
        }
        CacheBackendKind::Sqlite => Arc::new(SqliteBackend::open(Path::new(&config.db_path))?),
    };
    tracing::debug!(backend = backend.name(), "cache backend created");
    Ok(backend)
}
