use serde::{Deserialize, Serialize};

use super::defaults;

/// Which storage strategy backs a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackendKind {
    /// In-process map; lost on restart.
    Memory,
    /// JSON strings in a persistent key/value store.
    KeyValue,
    /// Durable transactional store (SQLite).
    Sqlite,
}

/// How entries are judged stale and which entry is evicted at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidationStrategy {
    Time,
    Version,
    Lru,
}

/// Tiered cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub ttl_secs: u64,
    /// Capacity in entries; `None` means unbounded.
    pub max_items: Option<usize>,
    pub strategy: InvalidationStrategy,
    /// Version stamped on new entries; entries with another version are stale
    /// under the `version` strategy.
    pub version: String,
    /// Queue writes made while offline and replay them on reconnect.
    pub offline_queue: bool,
    /// zstd-compress serialized payloads.
    pub compress: bool,
    /// Key prefix inside a shared key/value store.
    pub key_prefix: String,
    /// Database path for the SQLite backend.
    pub db_path: String,
    /// Byte quota for key/value stores that enforce one.
    pub quota_bytes: Option<usize>,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs.min(defaults::MAX_CACHE_TTL_SECS) as i64)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            ttl_secs: defaults::DEFAULT_CACHE_TTL_SECS,
            max_items: Some(defaults::DEFAULT_CACHE_MAX_ITEMS),
            strategy: InvalidationStrategy::Time,
            version: defaults::DEFAULT_CACHE_VERSION.to_string(),
            offline_queue: defaults::DEFAULT_OFFLINE_QUEUE,
            compress: defaults::DEFAULT_COMPRESS,
            key_prefix: defaults::DEFAULT_CACHE_KEY_PREFIX.to_string(),
            db_path: defaults::DEFAULT_CACHE_DB_FILENAME.to_string(),
            quota_bytes: None,
        }
    }
}
