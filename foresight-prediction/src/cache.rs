//! Memoised predictions keyed by current route.
//!
//! Uses `moka::sync::Cache` with a short TTL. Invalidated wholesale on every
//! recorded visit, since any visit can shift transition frequencies. Keys
//! carry a generation number so a lookup never sees a memo from before the
//! most recent invalidation, whatever moka's eviction timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use foresight_core::models::PredictionScore;
use moka::sync::Cache;

/// Maximum memoised routes.
const MAX_ENTRIES: u64 = 1_000;

/// Prediction memo with hit/miss tracking.
pub struct PredictionCache {
    cache: Cache<(u64, String), Vec<PredictionScore>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PredictionCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, route: &str) -> Option<Vec<PredictionScore>> {
        let key = (self.generation.load(Ordering::Acquire), route.to_string());
        match self.cache.get(&key) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Current generation. Read it before computing a memo and pass it to
    /// `insert`, so a memo computed across an invalidation is never served.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn insert(&self, generation: u64, route: String, scores: Vec<PredictionScore>) {
        self.cache.insert((generation, route), scores);
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cache.invalidate_all();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Cache hit rate (0.0–1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
