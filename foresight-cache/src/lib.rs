//! # foresight-cache
//!
//! Key/value cache with freshness envelopes over interchangeable storage
//! backends.
//!
//! | Backend | Durability | Access |
//! |---------|-----------|--------|
//! | `MemoryBackend` | process lifetime | inline |
//! | `KeyValueBackend` | whatever the `IKeyValueStore` provides | inline |
//! | `SqliteBackend` | transactional file | blocking pool |
//!
//! `TieredCache` owns the policy (TTL, version checks, eviction at capacity,
//! quota retry, offline write-behind); backends only store entries.

pub mod backend;
pub mod codec;
pub mod offline_queue;
pub mod stats;
pub mod store;
pub mod tiered;

pub use backend::{create_backend, EntryInfo, ICacheBackend, KeyValueBackend, MemoryBackend, SqliteBackend};
pub use offline_queue::{OfflineQueue, QueuedWrite, ReplayReport};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{JsonFileStore, MemoryKeyValueStore};
pub use tiered::TieredCache;

/// The stored form of every entry: the payload is already encoded.
pub type StoredEntry = foresight_core::models::CacheEntry<serde_json::Value>;
