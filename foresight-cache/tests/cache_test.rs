//! Integration tests for TieredCache across backends: freshness, eviction,
//! quota retry and offline write-behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use foresight_cache::{
    codec, create_backend, ICacheBackend, KeyValueBackend, MemoryBackend, MemoryKeyValueStore,
    ReplayReport, SqliteBackend, TieredCache,
};
use foresight_core::config::{CacheBackendKind, CacheConfig, InvalidationStrategy};
use foresight_core::models::{ConnectionSignals, EntryMetadata};
use foresight_core::traits::{IClock, IConnectivity, IKeyValueStore, ManualClock};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use test_fixtures::{InMemoryStore, RecordingTelemetry, TelemetryEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    path: String,
    body: String,
}

fn doc(path: &str) -> Document {
    Document {
        path: path.to_string(),
        body: format!("<main>{path}</main>"),
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
    ))
}

fn config(strategy: InvalidationStrategy, max_items: Option<usize>) -> CacheConfig {
    CacheConfig {
        strategy,
        max_items,
        ttl_secs: 60,
        ..Default::default()
    }
}

fn memory_cache(config: CacheConfig, clock: &Arc<ManualClock>) -> TieredCache<Document> {
    TieredCache::new(config, Arc::new(MemoryBackend::new()))
        .unwrap()
        .with_clock(clock.clone() as Arc<dyn IClock>)
}

struct Toggle(AtomicBool);

impl Toggle {
    fn new(online: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(online)))
    }

    fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl IConnectivity for Toggle {
    fn signals(&self) -> ConnectionSignals {
        if self.0.load(Ordering::SeqCst) {
            ConnectionSignals::broadband()
        } else {
            ConnectionSignals::offline()
        }
    }
}

#[tokio::test]
async fn round_trip_before_ttl() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock);
    let mut metadata = EntryMetadata::new();
    metadata.insert("etag".into(), serde_json::json!("abc"));

    cache.set("/docs", &doc("/docs"), Some(metadata)).await.unwrap();
    clock.advance(Duration::seconds(59));
    assert_eq!(cache.get("/docs").await.unwrap(), Some(doc("/docs")));
    assert!(cache.contains("/docs").await.unwrap());
}

#[tokio::test]
async fn expired_entry_is_absent_and_purged() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock);
    cache.set("/docs", &doc("/docs"), None).await.unwrap();

    clock.advance(Duration::seconds(61));
    assert!(!cache.contains("/docs").await.unwrap());
    assert_eq!(cache.len().await.unwrap(), 1);
    assert_eq!(cache.get("/docs").await.unwrap(), None);
    assert_eq!(cache.len().await.unwrap(), 0);
    assert_eq!(cache.stats().expirations, 1);
}

#[tokio::test]
async fn ttl_is_enforced_under_every_strategy() {
    for strategy in [InvalidationStrategy::Lru, InvalidationStrategy::Version] {
        let clock = clock();
        let cache = memory_cache(config(strategy, None), &clock);
        cache.set("k", &doc("k"), None).await.unwrap();
        clock.advance(Duration::seconds(120));
        assert_eq!(cache.get("k").await.unwrap(), None, "{strategy:?}");
    }
}

#[tokio::test]
async fn lru_evicts_least_recently_touched() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Lru, Some(3)), &clock);
    for key in ["a", "b", "c"] {
        cache.set(key, &doc(key), None).await.unwrap();
    }
    cache.get("a").await.unwrap();
    cache.get("c").await.unwrap();

    cache.set("d", &doc("d"), None).await.unwrap();
    assert_eq!(cache.len().await.unwrap(), 3);
    assert!(!cache.contains("b").await.unwrap());
    for key in ["a", "c", "d"] {
        assert!(cache.contains(key).await.unwrap(), "{key} should survive");
    }
    assert_eq!(cache.stats().evictions, 1);
}

#[tokio::test]
async fn overwrite_at_capacity_does_not_evict() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Lru, Some(2)), &clock);
    cache.set("a", &doc("a"), None).await.unwrap();
    cache.set("b", &doc("b"), None).await.unwrap();
    cache.set("a", &doc("a2"), None).await.unwrap();
    assert_eq!(cache.len().await.unwrap(), 2);
    assert_eq!(cache.stats().evictions, 0);
    assert_eq!(cache.get("a").await.unwrap().unwrap().path, "a2");
}

#[tokio::test]
async fn time_strategy_evicts_earliest_expiry() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Time, Some(2)), &clock);
    cache.set("first", &doc("first"), None).await.unwrap();
    clock.advance(Duration::seconds(5));
    cache.set("second", &doc("second"), None).await.unwrap();
    cache.get("first").await.unwrap();

    cache.set("third", &doc("third"), None).await.unwrap();
    assert!(!cache.contains("first").await.unwrap());
    assert!(cache.contains("second").await.unwrap());
}

#[tokio::test]
async fn version_strategy_prefers_stale_versions() {
    let clock = clock();
    let backend: Arc<dyn ICacheBackend> = Arc::new(MemoryBackend::new());
    let v1 = TieredCache::<Document>::new(
        CacheConfig {
            version: "1".into(),
            ..config(InvalidationStrategy::Version, Some(2))
        },
        backend.clone(),
    )
    .unwrap()
    .with_clock(clock.clone() as Arc<dyn IClock>);
    let v2 = TieredCache::<Document>::new(
        CacheConfig {
            version: "2".into(),
            ..config(InvalidationStrategy::Version, Some(2))
        },
        backend.clone(),
    )
    .unwrap()
    .with_clock(clock.clone() as Arc<dyn IClock>);

    v2.set("current", &doc("current"), None).await.unwrap();
    clock.advance(Duration::seconds(1));
    v1.set("legacy", &doc("legacy"), None).await.unwrap();

    // Version mismatch reads as absent.
    assert!(!v2.contains("legacy").await.unwrap());

    clock.advance(Duration::seconds(1));
    v2.set("new", &doc("new"), None).await.unwrap();
    assert!(backend.contains("current").unwrap());
    assert!(!backend.contains("legacy").unwrap());
}

#[tokio::test]
async fn purge_sweeps_only_stale_entries() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock);
    cache.set("old", &doc("old"), None).await.unwrap();
    clock.advance(Duration::seconds(45));
    cache.set("fresh", &doc("fresh"), None).await.unwrap();
    clock.advance(Duration::seconds(30));

    assert_eq!(cache.purge_expired().await.unwrap(), 1);
    assert!(cache.contains("fresh").await.unwrap());
}

#[tokio::test]
async fn quota_exceeded_evicts_oldest_and_retries_once() {
    let clock = clock();
    let store = Arc::new(MemoryKeyValueStore::with_quota(Some(700)));
    let backend = Arc::new(KeyValueBackend::new(store.clone(), "c."));
    let cache = TieredCache::<Document>::new(config(InvalidationStrategy::Time, None), backend)
        .unwrap()
        .with_clock(clock.clone() as Arc<dyn IClock>);

    let mut written = Vec::new();
    for i in 0..20 {
        let key = format!("/page/{i}");
        clock.advance(Duration::seconds(1));
        match cache.set(&key, &doc(&key), None).await {
            Ok(()) => written.push(key),
            Err(e) => panic!("set {key} failed: {e}"),
        }
        if cache.stats().quota_retries > 0 {
            break;
        }
    }
    assert!(cache.stats().quota_retries >= 1);
    assert!(!cache.contains(&written[0]).await.unwrap());
    assert!(cache.contains(written.last().unwrap()).await.unwrap());
    assert!(store.used_bytes() <= 700);
}

#[tokio::test]
async fn second_quota_failure_propagates() {
    let store = Arc::new(MemoryKeyValueStore::with_quota(Some(16)));
    let backend = Arc::new(KeyValueBackend::new(store, "c."));
    let cache = TieredCache::<Document>::new(config(InvalidationStrategy::Time, None), backend).unwrap();

    let err = cache.set("huge", &doc("huge"), None).await.unwrap_err();
    assert!(err.is_quota_exceeded());
}

#[tokio::test]
async fn offline_writes_replay_in_order() {
    let clock = clock();
    let online = Toggle::new(false);
    let target_store = Arc::new(InMemoryStore::new());
    let target = Arc::new(KeyValueBackend::new(target_store.clone(), ""));
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone())
        .with_sync_target(target.clone());

    for key in ["a", "b", "c"] {
        cache.set(key, &doc(key), None).await.unwrap();
    }
    assert_eq!(cache.pending_keys(), vec!["a", "b", "c"]);
    // Offline writes are still served locally.
    assert!(cache.contains("b").await.unwrap());

    target_store.fail_writes(true);
    online.set(true);
    let report = cache.on_connectivity_change(true).await.unwrap();
    assert_eq!(report, ReplayReport { committed: 0, remaining: 3 });
    assert_eq!(cache.pending_keys(), vec!["a", "b", "c"]);

    target_store.fail_writes(false);
    let report = cache.replay_offline_queue().await;
    assert_eq!(report, ReplayReport { committed: 3, remaining: 0 });
    assert_eq!(target_store.keys().unwrap(), vec!["a", "b", "c"]);
    assert!(cache.on_connectivity_change(false).await.is_none());
}

#[tokio::test]
async fn replay_halts_at_failed_write_and_resumes_in_order() {
    let clock = clock();
    let online = Toggle::new(false);
    let target_store = Arc::new(InMemoryStore::new());
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone())
        .with_sync_target(Arc::new(KeyValueBackend::new(target_store.clone(), "")));
    for key in ["k1", "k2", "k3"] {
        cache.set(key, &doc(key), None).await.unwrap();
    }

    target_store.fail_key("k2");
    online.set(true);
    let report = cache.on_connectivity_change(true).await.unwrap();
    assert_eq!(report, ReplayReport { committed: 1, remaining: 2 });
    assert_eq!(cache.pending_keys(), vec!["k2", "k3"]);
    assert_eq!(target_store.write_log(), vec!["k1"]);

    target_store.heal_key("k2");
    let report = cache.replay_offline_queue().await;
    assert_eq!(report, ReplayReport { committed: 2, remaining: 0 });
    assert_eq!(target_store.write_log(), vec!["k1", "k2", "k3"]);
}

#[tokio::test]
async fn delete_after_offline_write_survives_replay() {
    let clock = clock();
    let online = Toggle::new(false);
    let target_store = Arc::new(InMemoryStore::new());
    let local = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone());
    let synced = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone())
        .with_sync_target(Arc::new(KeyValueBackend::new(target_store.clone(), "")));

    for cache in [&local, &synced] {
        cache.set("k", &doc("v1"), None).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert_eq!(cache.pending_writes(), 0);
    }
    online.set(true);
    for cache in [&local, &synced] {
        cache.on_connectivity_change(true).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
    assert!(target_store.raw("k").is_none());
}

#[tokio::test]
async fn newer_online_write_wins_over_queued_one() {
    let clock = clock();
    let online = Toggle::new(false);
    let target = Arc::new(KeyValueBackend::new(Arc::new(InMemoryStore::new()), ""));
    let local = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone());
    let synced = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(online.clone())
        .with_sync_target(target.clone());

    for cache in [&local, &synced] {
        cache.set("k", &doc("old-offline"), None).await.unwrap();
    }
    online.set(true);
    for cache in [&local, &synced] {
        cache.set("k", &doc("new-online"), None).await.unwrap();
        assert_eq!(cache.pending_writes(), 0);
        let report = cache.on_connectivity_change(true).await.unwrap();
        assert_eq!(report, ReplayReport { committed: 0, remaining: 0 });
        assert_eq!(cache.get("k").await.unwrap(), Some(doc("new-online")));
    }

    let mirrored = target.peek("k").unwrap().unwrap();
    let value: Document = codec::decode("k", mirrored.data).unwrap();
    assert_eq!(value, doc("new-online"));
}

#[tokio::test]
async fn replay_respects_capacity() {
    let clock = clock();
    let online = Toggle::new(false);
    let cache = memory_cache(config(InvalidationStrategy::Lru, Some(2)), &clock)
        .with_connectivity(online.clone());

    for key in ["a", "b", "c", "d"] {
        clock.advance(Duration::seconds(1));
        cache.set(key, &doc(key), None).await.unwrap();
    }
    assert_eq!(cache.len().await.unwrap(), 2);
    assert_eq!(cache.pending_keys(), vec!["c", "d"]);

    online.set(true);
    let report = cache.on_connectivity_change(true).await.unwrap();
    assert_eq!(report, ReplayReport { committed: 2, remaining: 0 });
    assert_eq!(cache.len().await.unwrap(), 2);
    assert!(!cache.contains("a").await.unwrap());
    assert!(cache.contains("d").await.unwrap());
}

#[tokio::test]
async fn online_writes_are_not_queued() {
    let clock = clock();
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_connectivity(Toggle::new(true));
    cache.set("a", &doc("a"), None).await.unwrap();
    assert_eq!(cache.pending_writes(), 0);

    let disabled = memory_cache(
        CacheConfig {
            offline_queue: false,
            ..config(InvalidationStrategy::Time, None)
        },
        &clock,
    )
    .with_connectivity(Toggle::new(false));
    disabled.set("a", &doc("a"), None).await.unwrap();
    assert_eq!(disabled.pending_writes(), 0);
}

#[tokio::test]
async fn telemetry_sees_hits_and_misses() {
    let clock = clock();
    let telemetry = Arc::new(RecordingTelemetry::new());
    let cache = memory_cache(config(InvalidationStrategy::Time, None), &clock)
        .with_telemetry(telemetry.clone());
    cache.get("/x").await.unwrap();
    cache.set("/x", &doc("/x"), None).await.unwrap();
    cache.get("/x").await.unwrap();

    assert_eq!(
        telemetry.events(),
        vec![
            TelemetryEvent::CacheMiss("/x".into()),
            TelemetryEvent::CacheHit("/x".into()),
        ]
    );
    assert!((cache.stats().hit_rate() - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn compressed_payloads_are_transparent() {
    let clock = clock();
    let store = Arc::new(MemoryKeyValueStore::new());
    let backend = Arc::new(KeyValueBackend::new(store.clone(), "z."));
    let cache = TieredCache::<Document>::new(
        CacheConfig {
            compress: true,
            ..config(InvalidationStrategy::Time, None)
        },
        backend,
    )
    .unwrap()
    .with_clock(clock.clone() as Arc<dyn IClock>);

    let big = Document {
        path: "/big".into(),
        body: "lorem ipsum ".repeat(500),
    };
    cache.set("/big", &big, None).await.unwrap();
    let raw = store.get_item("z./big").unwrap().unwrap();
    assert!(raw.contains("$zstd"));
    assert!(raw.len() < big.body.len());
    assert_eq!(cache.get("/big").await.unwrap(), Some(big));
}

#[tokio::test]
async fn sqlite_backend_through_factory() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        backend: CacheBackendKind::Sqlite,
        db_path: dir.path().join("cache.db").display().to_string(),
        max_items: Some(2),
        strategy: InvalidationStrategy::Lru,
        ..Default::default()
    };
    let cache = TieredCache::<Document>::from_config(config.clone(), None).unwrap();
    assert_eq!(cache.backend_name(), "sqlite");

    cache.set("a", &doc("a"), None).await.unwrap();
    cache.set("b", &doc("b"), None).await.unwrap();
    cache.get("a").await.unwrap();
    cache.set("c", &doc("c"), None).await.unwrap();
    assert!(!cache.contains("b").await.unwrap());
    drop(cache);

    let reopened = TieredCache::<Document>::from_config(config, None).unwrap();
    assert_eq!(reopened.get("a").await.unwrap(), Some(doc("a")));
    assert_eq!(reopened.len().await.unwrap(), 2);
}

#[tokio::test]
async fn namespaces_partition_a_shared_backend() {
    let clock = clock();
    let backend: Arc<dyn ICacheBackend> = Arc::new(MemoryBackend::new());
    let pages: TieredCache<Document> = TieredCache::new(config(InvalidationStrategy::Time, None), backend.clone())
        .unwrap()
        .with_clock(clock.clone() as Arc<dyn IClock>)
        .with_namespace("page:");
    let titles: TieredCache<String> = TieredCache::new(config(InvalidationStrategy::Time, None), backend.clone())
        .unwrap()
        .with_clock(clock.clone() as Arc<dyn IClock>)
        .with_namespace("title:");

    pages.set("/a", &doc("/a"), None).await.unwrap();
    titles.set("/a", &"Home".to_string(), None).await.unwrap();

    assert_eq!(pages.get("/a").await.unwrap(), Some(doc("/a")));
    assert_eq!(titles.get("/a").await.unwrap().as_deref(), Some("Home"));
    assert_eq!(pages.len().await.unwrap(), 1);
    assert_eq!(backend.size().unwrap(), 2);

    titles.clear().await.unwrap();
    assert!(titles.is_empty().await.unwrap());
    assert_eq!(pages.get("/a").await.unwrap(), Some(doc("/a")));
}

#[tokio::test]
async fn key_value_factory_uses_provided_store() {
    let store = Arc::new(InMemoryStore::new());
    let config = CacheConfig {
        backend: CacheBackendKind::KeyValue,
        ..Default::default()
    };
    let backend = create_backend(&config, Some(store.clone() as Arc<dyn IKeyValueStore>)).unwrap();
    let cache = TieredCache::<Document>::new(config, backend).unwrap();
    cache.set("/a", &doc("/a"), None).await.unwrap();
    assert!(store.raw("foresight.cache./a").is_some());
}

#[test]
fn sqlite_in_memory_is_blocking() {
    assert!(SqliteBackend::open_in_memory().unwrap().is_blocking());
    assert!(!MemoryBackend::new().is_blocking());
}

proptest! {
    #[test]
    fn get_after_set_observes_last_write(ops in prop::collection::vec((0u8..6, 0u32..1000), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let clock = clock();
            let cache = TieredCache::<u32>::new(
                config(InvalidationStrategy::Lru, None),
                Arc::new(MemoryBackend::new()),
            )
            .unwrap()
            .with_clock(clock as Arc<dyn IClock>);

            let mut expected = std::collections::HashMap::new();
            for (key, value) in &ops {
                let key = format!("k{key}");
                cache.set(&key, value, None).await.unwrap();
                expected.insert(key, *value);
            }
            for (key, value) in &expected {
                prop_assert_eq!(cache.get(key).await.unwrap(), Some(*value));
            }
            Ok(())
        })?;
    }
}
