//! RouteTransitionPredictor: records navigation, persists the model, and
//! answers "where will the user go next".

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use foresight_core::config::{validate_prediction, PredictionConfig};
use foresight_core::constants::MAX_TRACKED_ROUTES;
use foresight_core::errors::{ConfigError, ForesightResult};
use foresight_core::models::{PredictionScore, RouteStats};
use foresight_core::traits::{IClock, IKeyValueStore, SystemClock};

use crate::cache::PredictionCache;
use crate::persistence;
use crate::scoring::{score_transitions, ScoreWeights};

#[derive(Default)]
struct ModelState {
    routes: HashMap<String, RouteStats>,
    previous: Option<String>,
}

/// First-order route transition model.
pub struct RouteTransitionPredictor {
    config: PredictionConfig,
    weights: ScoreWeights,
    state: Mutex<ModelState>,
    store: Option<Arc<dyn IKeyValueStore>>,
    clock: Arc<dyn IClock>,
    cache: PredictionCache,
}

impl RouteTransitionPredictor {
    /// Create a predictor and restore any persisted model from `store`.
    ///
    /// Persisted routes older than the configured max age are dropped here,
    /// not just hidden at prediction time.
    pub fn new(
        config: PredictionConfig,
        store: Option<Arc<dyn IKeyValueStore>>,
        clock: Arc<dyn IClock>,
    ) -> Result<Self, ConfigError> {
        validate_prediction(&config)?;
        let predictor = Self {
            weights: ScoreWeights::from(&config),
            cache: PredictionCache::new(Duration::from_secs(config.cache_ttl_secs.max(1))),
            config,
            state: Mutex::new(ModelState::default()),
            store,
            clock,
        };
        predictor.restore();
        Ok(predictor)
    }

    /// A non-persistent predictor on the system clock.
    pub fn in_memory(config: PredictionConfig) -> Result<Self, ConfigError> {
        Self::new(config, None, Arc::new(SystemClock))
    }

    fn lock(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn restore(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let raw = match store.get_item(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted route stats");
                return;
            }
        };

        let now = self.clock.now();
        let max_age = self.config.max_age();
        let mut loaded = 0usize;
        let mut expired = 0usize;
        let mut state = self.lock();
        for stats in persistence::decode(&raw) {
            if stats.is_stale(now, max_age) {
                expired += 1;
                continue;
            }
            loaded += 1;
            state.routes.insert(stats.path.clone(), stats);
        }
        tracing::debug!(loaded, expired, "restored route stats");
    }

    /// Record a navigation to `path`.
    ///
    /// Counts a transition from the previous route when there is one and it
    /// differs. The whole table is persisted afterwards; persistence failures
    /// are logged, never returned.
    pub fn record_visit(&self, path: &str) {
        let now = self.clock.now();
        let snapshot = {
            let mut state = self.lock();
            state
                .routes
                .entry(path.to_string())
                .or_insert_with(|| RouteStats::new(path, now))
                .record_visit(now);

            if let Some(previous) = state.previous.take() {
                if previous != path {
                    state
                        .routes
                        .entry(previous.clone())
                        .or_insert_with(|| RouteStats::new(previous.as_str(), now))
                        .record_transition(path);
                }
            }
            state.previous = Some(path.to_string());

            if state.routes.len() > MAX_TRACKED_ROUTES {
                prune(&mut state.routes, now, self.config.max_age());
            }
            persistence::encode(state.routes.values())
        };

        self.cache.invalidate_all();
        self.persist(snapshot);
    }

    fn persist(&self, snapshot: ForesightResult<String>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = snapshot.and_then(|raw| store.set_item(&self.config.storage_key, &raw));
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist route stats");
        }
    }

    /// Ranked next-route candidates for `current`, best first.
    ///
    /// `is_prefetched` lets the caller exclude paths it already holds.
    pub fn predict(&self, current: &str, is_prefetched: &dyn Fn(&str) -> bool) -> Vec<PredictionScore> {
        let scores = match self.cache.get(current) {
            Some(scores) => scores,
            None => {
                let generation = self.cache.generation();
                let now = self.clock.now();
                let scores = {
                    let state = self.lock();
                    match state.routes.get(current) {
                        Some(source) if !source.transitions.is_empty() => {
                            score_transitions(source, &state.routes, now, &self.weights)
                        }
                        _ => Vec::new(),
                    }
                };
                self.cache.insert(generation, current.to_string(), scores.clone());
                scores
            }
        };

        scores
            .into_iter()
            .filter(|s| s.path != current && !is_prefetched(&s.path))
            .collect()
    }

    /// Drop routes not visited within the max age. Returns how many were removed.
    pub fn prune_stale(&self) -> usize {
        let now = self.clock.now();
        let (removed, snapshot) = {
            let mut state = self.lock();
            let removed = prune(&mut state.routes, now, self.config.max_age());
            (removed, persistence::encode(state.routes.values()))
        };
        if removed > 0 {
            self.cache.invalidate_all();
            self.persist(snapshot);
        }
        removed
    }

    /// Forget everything, including the persisted copy.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.routes.clear();
            state.previous = None;
        }
        self.cache.invalidate_all();
        if let Some(store) = &self.store {
            if let Err(e) = store.remove_item(&self.config.storage_key) {
                tracing::warn!(error = %e, "failed to remove persisted route stats");
            }
        }
    }

    /// Snapshot of the stats for one route.
    pub fn stats(&self, path: &str) -> Option<RouteStats> {
        self.lock().routes.get(path).cloned()
    }

    pub fn route_count(&self) -> usize {
        self.lock().routes.len()
    }

    pub fn previous_route(&self) -> Option<String> {
        self.lock().previous.clone()
    }

    /// The `n` most visited live routes, most visited first.
    pub fn top_routes(&self, n: usize) -> Vec<(String, u64)> {
        let now = self.clock.now();
        let max_age = self.config.max_age();
        let state = self.lock();
        let mut routes: Vec<(String, u64)> = state
            .routes
            .values()
            .filter(|r| !r.is_stale(now, max_age))
            .map(|r| (r.path.clone(), r.visits))
            .collect();
        routes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        routes.truncate(n);
        routes
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }
}

fn prune(routes: &mut HashMap<String, RouteStats>, now: DateTime<Utc>, max_age: chrono::Duration) -> usize {
    let before = routes.len();
    routes.retain(|_, stats| !stats.is_stale(now, max_age));
    before - routes.len()
}
