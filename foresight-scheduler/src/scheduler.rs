//! PrefetchScheduler: admission, gating and execution of prefetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use foresight_cache::TieredCache;
use foresight_core::config::{validate_scheduler, SchedulerConfig};
use foresight_core::constants::RATE_LIMIT_WINDOW_SECS;
use foresight_core::errors::{ConfigError, FetchError};
use foresight_core::models::{
    HintType, NetworkQuality, PrefetchOutcome, PrefetchState, ResourceHint, SkipReason, TriggerMethod,
};
use foresight_core::traits::{IFetchStrategy, ITelemetry, NoopTelemetry};
use foresight_hints::ResourceHintManager;
use foresight_network::NetworkMonitor;
use foresight_prediction::RouteTransitionPredictor;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::handle::PrefetchHandle;
use crate::rate_limiter::RateLimiter;
use crate::record::PrefetchRecord;
use crate::tracing_setup::events;

/// Collaborators the scheduler drives.
pub struct SchedulerParts {
    pub network: Arc<NetworkMonitor>,
    pub predictor: Arc<RouteTransitionPredictor>,
    pub fetch: Arc<dyn IFetchStrategy>,
    /// Optimistic per-path records.
    pub records: Option<Arc<TieredCache<PrefetchRecord>>>,
    /// When present, each fetch is mirrored as a `prefetch` hint.
    pub hints: Option<ResourceHintManager>,
    pub telemetry: Arc<dyn ITelemetry>,
}

impl SchedulerParts {
    pub fn new(
        network: Arc<NetworkMonitor>,
        predictor: Arc<RouteTransitionPredictor>,
        fetch: Arc<dyn IFetchStrategy>,
    ) -> Self {
        Self {
            network,
            predictor,
            fetch,
            records: None,
            hints: None,
            telemetry: Arc::new(NoopTelemetry),
        }
    }
}

#[derive(Default)]
pub(crate) struct SchedulerState {
    pub(crate) current_route: Option<String>,
    /// Paths not present here are idle.
    pub(crate) paths: HashMap<String, PrefetchState>,
    pub(crate) hover_timers: HashMap<String, JoinHandle<()>>,
    pub(crate) prediction_task: Option<JoinHandle<()>>,
}

pub(crate) struct Inner {
    pub(crate) config: SchedulerConfig,
    pub(crate) parts: SchedulerParts,
    limiter: RateLimiter,
    permits: Arc<Semaphore>,
    state: Mutex<SchedulerState>,
}

/// Turns trigger signals into at-most-once prefetches.
///
/// Entry points never block and never return errors; outcomes are reported
/// through `PrefetchHandle`, telemetry and logs. Cloning is cheap and clones
/// share state.
#[derive(Clone)]
pub struct PrefetchScheduler {
    pub(crate) inner: Arc<Inner>,
}

impl PrefetchScheduler {
    pub fn new(config: SchedulerConfig, parts: SchedulerParts) -> Result<Self, ConfigError> {
        validate_scheduler(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                limiter: RateLimiter::new(
                    config.max_prefetches_per_minute,
                    Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
                ),
                permits: Arc::new(Semaphore::new(config.max_concurrent_prefetches)),
                config,
                parts,
                state: Mutex::new(SchedulerState::default()),
            }),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Request a prefetch of `path`.
    ///
    /// Skips are decided immediately: the current route, paths already
    /// prefetched or in flight, a network below the method's tier, and an
    /// exhausted rate window.
    pub fn prefetch(&self, path: &str, method: TriggerMethod) -> PrefetchHandle {
        if let Err(reason) = self.inner.admit(path, method) {
            events::prefetch_skipped(path, method, reason);
            return PrefetchHandle::ready(PrefetchOutcome::Skipped(reason));
        }
        let Ok(runtime) = Handle::try_current() else {
            self.inner.lock().paths.remove(path);
            tracing::warn!(path, "prefetch requested outside an async runtime");
            return PrefetchHandle::ready(PrefetchOutcome::Failed("no async runtime".to_string()));
        };
        let inner = Arc::clone(&self.inner);
        PrefetchHandle::running(runtime.spawn(inner.run(path.to_string(), method)))
    }

    /// Explicit prefetch request; gated and deduplicated like any other.
    pub fn prefetch_manual(&self, path: &str) -> PrefetchHandle {
        self.prefetch(path, TriggerMethod::Manual)
    }

    pub fn state_of(&self, path: &str) -> PrefetchState {
        self.inner
            .lock()
            .paths
            .get(path)
            .copied()
            .unwrap_or(PrefetchState::Idle)
    }

    pub fn is_prefetched(&self, path: &str) -> bool {
        self.state_of(path) == PrefetchState::Resolved
    }

    pub fn current_route(&self) -> Option<String> {
        self.inner.lock().current_route.clone()
    }

    /// Paths prefetched this session, sorted.
    pub fn prefetched_paths(&self) -> Vec<String> {
        let state = self.inner.lock();
        let mut paths: Vec<String> = state
            .paths
            .iter()
            .filter(|(_, s)| **s == PrefetchState::Resolved)
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner
            .lock()
            .paths
            .values()
            .filter(|s| matches!(s, PrefetchState::Queued | PrefetchState::InFlight))
            .count()
    }

    /// Start a new session: forget which paths were prefetched.
    pub fn reset_session(&self) {
        self.inner
            .lock()
            .paths
            .retain(|_, s| *s != PrefetchState::Resolved);
    }

    /// Cancel pending timers. In-flight fetches run to completion.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock();
        for (_, timer) in state.hover_timers.drain() {
            timer.abort();
        }
        if let Some(task) = state.prediction_task.take() {
            task.abort();
        }
    }

    pub fn network_quality(&self) -> NetworkQuality {
        self.inner.parts.network.refresh()
    }
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admit(&self, path: &str, method: TriggerMethod) -> Result<(), SkipReason> {
        let mut state = self.lock();
        if state.current_route.as_deref() == Some(path) {
            return Err(SkipReason::CurrentRoute);
        }
        match state.paths.get(path) {
            Some(PrefetchState::Resolved) => return Err(SkipReason::AlreadyPrefetched),
            Some(PrefetchState::Queued | PrefetchState::InFlight) => return Err(SkipReason::InFlight),
            _ => {}
        }
        if !self.network_allows(method) {
            return Err(SkipReason::NetworkTooSlow);
        }
        if !self.limiter.try_acquire() {
            return Err(SkipReason::RateLimited);
        }
        state.paths.insert(path.to_string(), PrefetchState::Queued);
        Ok(())
    }

    /// Classifies the live signals, so a connectivity change counts before
    /// the next poll.
    fn network_allows(&self, method: TriggerMethod) -> bool {
        let quality = self.parts.network.refresh();
        quality != NetworkQuality::Offline && quality.meets(self.config.thresholds.required(method))
    }

    async fn run(self: Arc<Self>, path: String, method: TriggerMethod) -> PrefetchOutcome {
        let _permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.lock().paths.remove(&path);
                return PrefetchOutcome::Failed("scheduler closed".to_string());
            }
        };

        // The user may have navigated to the path, or the network may have
        // dropped, while it was queued.
        let network_ok = self.network_allows(method);
        {
            let mut state = self.lock();
            let skip = if state.current_route.as_deref() == Some(path.as_str()) {
                Some(SkipReason::CurrentRoute)
            } else if !network_ok {
                Some(SkipReason::NetworkTooSlow)
            } else {
                None
            };
            if let Some(reason) = skip {
                state.paths.remove(&path);
                drop(state);
                events::prefetch_skipped(&path, method, reason);
                return PrefetchOutcome::Skipped(reason);
            }
            state.paths.insert(path.clone(), PrefetchState::InFlight);
        }

        self.parts.telemetry.on_prefetch_start(&path, method);
        self.write_record(&path, method, PrefetchState::InFlight).await;
        if let Some(hints) = &self.parts.hints {
            hints.add_hint(ResourceHint::prefetch(path.clone()));
        }

        let timeout = self.config.prefetch_timeout();
        let result = match tokio::time::timeout(timeout, self.parts.fetch.fetch(&path)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::TimedOut {
                path: path.clone(),
                after_ms: timeout.as_millis() as u64,
            }
            .into()),
        };

        match result {
            Ok(()) => {
                self.lock().paths.insert(path.clone(), PrefetchState::Resolved);
                self.write_record(&path, method, PrefetchState::Resolved).await;
                self.retire_hint(&path, true);
                self.parts.telemetry.on_prefetch_success(&path, method);
                PrefetchOutcome::Prefetched
            }
            Err(e) => {
                self.lock().paths.remove(&path);
                self.remove_record(&path).await;
                self.retire_hint(&path, false);
                let message = e.to_string();
                self.parts.telemetry.on_prefetch_error(&path, method, &message);
                PrefetchOutcome::Failed(message)
            }
        }
    }

    async fn write_record(&self, path: &str, method: TriggerMethod, state: PrefetchState) {
        let Some(records) = &self.parts.records else {
            return;
        };
        let record = PrefetchRecord {
            path: path.to_string(),
            method,
            state,
            started_at: Utc::now(),
        };
        if let Err(e) = records.set(path, &record, None).await {
            tracing::warn!(path, error = %e, "failed to write prefetch record");
        }
    }

    async fn remove_record(&self, path: &str) {
        let Some(records) = &self.parts.records else {
            return;
        };
        if let Err(e) = records.delete(path).await {
            tracing::warn!(path, error = %e, "failed to remove prefetch record");
        }
    }

    fn retire_hint(&self, path: &str, loaded: bool) {
        let Some(hints) = &self.parts.hints else {
            return;
        };
        if loaded {
            hints.on_hint_complete(HintType::Prefetch, path);
        } else {
            hints.on_hint_failed(HintType::Prefetch, path);
        }
        if hints.is_pending(HintType::Prefetch, path) {
            hints.cancel_hint(HintType::Prefetch, path);
        }
    }
}
