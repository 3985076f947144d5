//! TieredCache: freshness policy, eviction and offline write-behind over an
//! `ICacheBackend`.

use std::marker::PhantomData;
use std::sync::Arc;

use foresight_core::config::{validate_cache, CacheConfig, InvalidationStrategy};
use foresight_core::errors::{ConfigError, ForesightResult, StorageError};
use foresight_core::models::{CacheEntry, EntryMetadata};
use foresight_core::traits::{IClock, IConnectivity, IKeyValueStore, ITelemetry, NoopTelemetry, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{create_backend, ICacheBackend};
use crate::codec;
use crate::offline_queue::{OfflineQueue, QueuedWrite, ReplayReport};
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::StoredEntry;

/// Run `f` against `backend`, on the blocking pool if the backend blocks.
async fn run<R, F>(backend: &Arc<dyn ICacheBackend>, f: F) -> ForesightResult<R>
where
    R: Send + 'static,
    F: FnOnce(&dyn ICacheBackend) -> ForesightResult<R> + Send + 'static,
{
    if !backend.is_blocking() {
        return f(backend.as_ref());
    }
    let backend = Arc::clone(backend);
    let name = backend.name();
    tokio::task::spawn_blocking(move || f(backend.as_ref()))
        .await
        .map_err(|e| StorageError::Backend {
            backend: name.to_string(),
            message: e.to_string(),
        })?
}

/// A typed cache of `T` values.
///
/// Values are serialized through `codec`, so any serde type works and the
/// same backend can be shared by caches of different types under distinct
/// key prefixes.
pub struct TieredCache<T> {
    config: CacheConfig,
    backend: Arc<dyn ICacheBackend>,
    /// `None` when offline writes only need to reach the primary backend.
    sync_target: Option<Arc<dyn ICacheBackend>>,
    connectivity: Option<Arc<dyn IConnectivity>>,
    clock: Arc<dyn IClock>,
    telemetry: Arc<dyn ITelemetry>,
    namespace: String,
    offline: OfflineQueue,
    stats: CacheStats,
    _payload: PhantomData<fn() -> T>,
}

impl<T> TieredCache<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Wrap an existing backend.
    pub fn new(config: CacheConfig, backend: Arc<dyn ICacheBackend>) -> Result<Self, ConfigError> {
        validate_cache(&config)?;
        Ok(Self {
            config,
            sync_target: None,
            backend,
            connectivity: None,
            clock: Arc::new(SystemClock),
            telemetry: Arc::new(NoopTelemetry),
            namespace: String::new(),
            offline: OfflineQueue::default(),
            stats: CacheStats::default(),
            _payload: PhantomData,
        })
    }

    /// Build the configured backend and wrap it.
    pub fn from_config(
        config: CacheConfig,
        store: Option<Arc<dyn IKeyValueStore>>,
    ) -> ForesightResult<Self> {
        validate_cache(&config)?;
        let backend = create_backend(&config, store)?;
        Ok(Self::new(config, backend)?)
    }

    pub fn with_clock(mut self, clock: Arc<dyn IClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Arc<dyn IConnectivity>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn ITelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Mirror writes into `target`: directly while online, through the
    /// offline queue otherwise. Passing the primary backend is a no-op.
    pub fn with_sync_target(mut self, target: Arc<dyn ICacheBackend>) -> Self {
        let same = std::ptr::eq(
            Arc::as_ptr(&target) as *const (),
            Arc::as_ptr(&self.backend) as *const (),
        );
        self.sync_target = (!same).then_some(target);
        self
    }

    /// Prefix every key with `namespace`, so several caches can share one
    /// backend. Capacity and eviction stay shared.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    fn is_fresh(&self, entry: &StoredEntry) -> bool {
        if entry.is_expired(self.clock.now()) {
            return false;
        }
        match self.config.strategy {
            InvalidationStrategy::Version => entry.matches_version(&self.config.version),
            InvalidationStrategy::Time | InvalidationStrategy::Lru => true,
        }
    }

    fn is_offline(&self) -> bool {
        self.connectivity.as_ref().is_some_and(|c| !c.is_online())
    }

    /// Store `data` under `key`, stamped with the configured version and TTL.
    ///
    /// At capacity a new key evicts one entry per the invalidation strategy.
    /// A quota failure evicts the oldest entry and retries once.
    pub async fn set(&self, key: &str, data: &T, metadata: Option<EntryMetadata>) -> ForesightResult<()> {
        let payload = codec::encode(data, self.config.compress)?;
        let entry = CacheEntry::new(
            payload,
            self.config.version.clone(),
            self.clock.now(),
            self.config.ttl(),
            metadata,
        );

        let stored_key = self.storage_key(key);
        if let Some(max_items) = self.config.max_items {
            let owned = stored_key.clone();
            let (exists, size) = run(&self.backend, move |b| Ok((b.contains(&owned)?, b.size()?))).await?;
            if !exists && size >= max_items {
                self.evict_one().await?;
            }
        }

        match self.write(&self.backend, &stored_key, entry.clone()).await {
            Err(e) if e.is_quota_exceeded() => {
                tracing::warn!(key, error = %e, "cache quota exceeded, evicting oldest and retrying");
                self.stats.quota_retry();
                if let Some(victim) = run(&self.backend, |b| b.oldest()).await? {
                    self.evict(victim).await?;
                }
                self.write(&self.backend, &stored_key, entry.clone()).await?;
            }
            other => other?,
        }

        if self.is_offline() {
            if self.config.offline_queue {
                tracing::debug!(key, "offline, queueing write for replay");
                self.offline.enqueue(QueuedWrite {
                    key: stored_key,
                    entry,
                    queued_at: self.clock.now(),
                });
            }
            return Ok(());
        }

        // An online write supersedes anything queued for the key.
        self.offline.discard(&stored_key);
        if let Some(target) = &self.sync_target {
            self.write(target, &stored_key, entry).await?;
        }
        Ok(())
    }

    async fn write(&self, backend: &Arc<dyn ICacheBackend>, key: &str, entry: StoredEntry) -> ForesightResult<()> {
        let key = key.to_string();
        run(backend, move |b| b.set(&key, entry)).await
    }

    async fn evict_one(&self) -> ForesightResult<()> {
        let victim = match self.config.strategy {
            InvalidationStrategy::Lru => run(&self.backend, |b| b.least_recently_used()).await?,
            InvalidationStrategy::Time => run(&self.backend, |b| b.earliest_expiry()).await?,
            InvalidationStrategy::Version => {
                let version = self.config.version.clone();
                run(&self.backend, move |b| match b.stale_version(&version)? {
                    Some(key) => Ok(Some(key)),
                    None => b.oldest(),
                })
                .await?
            }
        };
        if let Some(victim) = victim {
            self.evict(victim).await?;
        }
        Ok(())
    }

    async fn evict(&self, key: String) -> ForesightResult<()> {
        tracing::debug!(key = %key, strategy = ?self.config.strategy, "evicting cache entry");
        if self.sync_target.is_none() {
            self.offline.discard(&key);
        }
        run(&self.backend, move |b| b.delete(&key)).await?;
        self.stats.eviction();
        Ok(())
    }

    /// Fresh value for `key`, or `None`. Stale entries are deleted on read.
    pub async fn get(&self, key: &str) -> ForesightResult<Option<T>> {
        let owned = self.storage_key(key);
        let Some(entry) = run(&self.backend, move |b| b.get(&owned)).await? else {
            self.record_miss(key);
            return Ok(None);
        };

        if !self.is_fresh(&entry) {
            self.stats.expiration();
            self.delete(key).await?;
            self.record_miss(key);
            return Ok(None);
        }

        match codec::decode(key, entry.data) {
            Ok(value) => {
                self.stats.hit();
                self.telemetry.on_cache_hit(key);
                Ok(Some(value))
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "dropping undecodable cache entry");
                self.delete(key).await?;
                self.record_miss(key);
                Ok(None)
            }
        }
    }

    fn record_miss(&self, key: &str) {
        self.stats.miss();
        self.telemetry.on_cache_miss(key);
    }

    /// Returns whether an entry was removed. Queued offline writes for the
    /// key are dropped, and the sync target forgets it too while online.
    pub async fn delete(&self, key: &str) -> ForesightResult<bool> {
        let owned = self.storage_key(key);
        self.offline.discard(&owned);
        if let (Some(target), false) = (&self.sync_target, self.is_offline()) {
            let target_key = owned.clone();
            run(target, move |b| b.delete(&target_key)).await?;
        }
        run(&self.backend, move |b| b.delete(&owned)).await
    }

    /// Remove every entry in this namespace and any queued offline writes.
    pub async fn clear(&self) -> ForesightResult<()> {
        self.offline.clear();
        if self.namespace.is_empty() {
            return run(&self.backend, |b| b.clear()).await;
        }
        let namespace = self.namespace.clone();
        run(&self.backend, move |b| {
            for key in b.keys()? {
                if key.starts_with(&namespace) {
                    b.delete(&key)?;
                }
            }
            Ok(())
        })
        .await
    }

    /// Whether a fresh entry exists. Does not count as an access.
    pub async fn contains(&self, key: &str) -> ForesightResult<bool> {
        let owned = self.storage_key(key);
        let entry = run(&self.backend, move |b| b.peek(&owned)).await?;
        Ok(entry.is_some_and(|e| self.is_fresh(&e)))
    }

    /// Stored entries in this namespace, including ones not yet found stale.
    pub async fn len(&self) -> ForesightResult<usize> {
        if self.namespace.is_empty() {
            return run(&self.backend, |b| b.size()).await;
        }
        let namespace = self.namespace.clone();
        run(&self.backend, move |b| {
            Ok(b.keys()?.iter().filter(|k| k.starts_with(&namespace)).count())
        })
        .await
    }

    pub async fn is_empty(&self) -> ForesightResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Delete every expired or stale-version entry. Returns how many went.
    pub async fn purge_expired(&self) -> ForesightResult<usize> {
        let now = self.clock.now();
        let strategy = self.config.strategy;
        let version = self.config.version.clone();
        let namespace = self.namespace.clone();
        let purged = run(&self.backend, move |b| {
            let mut purged = 0;
            for info in b.scan()? {
                if !info.key.starts_with(&namespace) {
                    continue;
                }
                let stale = now > info.expires_at
                    || (strategy == InvalidationStrategy::Version && info.version != version);
                if stale && b.delete(&info.key)? {
                    purged += 1;
                }
            }
            Ok(purged)
        })
        .await?;
        for _ in 0..purged {
            self.stats.expiration();
        }
        if purged > 0 {
            tracing::debug!(purged, "purged stale cache entries");
        }
        Ok(purged)
    }

    /// React to a connectivity transition; replays queued writes when online.
    pub async fn on_connectivity_change(&self, online: bool) -> Option<ReplayReport> {
        if !online {
            return None;
        }
        Some(self.replay_offline_queue().await)
    }

    /// Replay queued writes into the sync target, oldest first.
    ///
    /// Stops at the first failure; the failed write goes back to the head of
    /// the queue and waits for the next replay. Without a sync target the
    /// writes already live in the primary backend and are only confirmed.
    pub async fn replay_offline_queue(&self) -> ReplayReport {
        let mut committed = 0;
        while let Some(write) = self.offline.pop_front() {
            let Some(target) = &self.sync_target else {
                committed += 1;
                continue;
            };
            match self.write(target, &write.key, write.entry.clone()).await {
                Ok(()) => committed += 1,
                Err(e) => {
                    tracing::warn!(key = %write.key, error = %e, "offline replay failed, halting");
                    self.offline.requeue_front(write);
                    break;
                }
            }
        }
        let report = ReplayReport {
            committed,
            remaining: self.offline.len(),
        };
        if committed > 0 || report.remaining > 0 {
            tracing::info!(
                committed = report.committed,
                remaining = report.remaining,
                "offline queue replayed"
            );
        }
        report
    }

    pub fn pending_writes(&self) -> usize {
        self.offline.len()
    }

    /// Keys waiting in the offline queue, head first, without the namespace.
    pub fn pending_keys(&self) -> Vec<String> {
        self.offline
            .keys()
            .into_iter()
            .map(|k| k.strip_prefix(self.namespace.as_str()).map(str::to_string).unwrap_or(k))
            .collect()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
