//! ResourceHintManager: the only writer of hint declarations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Instant;

use foresight_core::config::{validate_hints, HintConfig};
use foresight_core::errors::{ConfigError, HintError};
use foresight_core::models::{HintType, ResourceHint};
use foresight_core::traits::IHintSink;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use crate::queue::PendingQueue;

type HintKey = (HintType, String);
type Waiter = oneshot::Sender<Result<(), HintError>>;

struct Applied {
    hint: ResourceHint,
    id: u64,
    applied_at: Instant,
}

#[derive(Default)]
struct HintState {
    pending: PendingQueue,
    applied: HashMap<HintKey, Applied>,
    waiters: HashMap<HintKey, Vec<Waiter>>,
    next_id: u64,
}

struct Inner {
    config: HintConfig,
    sink: Arc<dyn IHintSink>,
    state: Mutex<HintState>,
}

/// Schedules resource hints onto an `IHintSink`.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct ResourceHintManager {
    inner: Arc<Inner>,
}

impl ResourceHintManager {
    pub fn new(config: HintConfig, sink: Arc<dyn IHintSink>) -> Result<Self, ConfigError> {
        validate_hints(&config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                sink,
                state: Mutex::new(HintState::default()),
            }),
        })
    }

    pub fn config(&self) -> &HintConfig {
        &self.inner.config
    }

    /// Queue a hint. Returns `false` if an identical hint is already pending
    /// or applied.
    pub fn add_hint(&self, hint: ResourceHint) -> bool {
        self.add_hints(std::iter::once(hint)) == 1
    }

    /// Queue several hints and run one scheduling pass. Returns how many
    /// were new.
    pub fn add_hints(&self, hints: impl IntoIterator<Item = ResourceHint>) -> usize {
        let mut state = self.inner.lock();
        let added = hints
            .into_iter()
            .filter(|hint| self.inner.enqueue(&mut state, hint.clone()))
            .count();
        let applied = self.inner.schedule(&mut state);
        drop(state);
        self.arm_timeouts(applied);
        added
    }

    /// Resolve every applied hint for `url` as loaded.
    pub fn on_resource_complete(&self, url: &str) -> usize {
        self.resolve_where(|(_, u)| u == url, Ok(()))
    }

    /// Resolve every applied hint for `url` as failed.
    pub fn on_resource_failed(&self, url: &str) -> usize {
        self.resolve_where(
            |(_, u)| u == url,
            Err(HintError::LoadFailed { url: url.to_string() }),
        )
    }

    /// Resolve only the applied `hint_type` hint for `url`. Other hints for
    /// the same url keep their slots and waiters.
    pub fn on_hint_complete(&self, hint_type: HintType, url: &str) -> bool {
        self.resolve_where(|(t, u)| *t == hint_type && u == url, Ok(())) == 1
    }

    pub fn on_hint_failed(&self, hint_type: HintType, url: &str) -> bool {
        self.resolve_where(
            |(t, u)| *t == hint_type && u == url,
            Err(HintError::LoadFailed { url: url.to_string() }),
        ) == 1
    }

    fn resolve_where(&self, matches: impl Fn(&HintKey) -> bool, outcome: Result<(), HintError>) -> usize {
        let mut state = self.inner.lock();
        let keys: Vec<HintKey> = state.applied.keys().filter(|k| matches(k)).cloned().collect();
        for key in &keys {
            self.inner.resolve(&mut state, key, outcome.clone());
        }
        let applied = self.inner.schedule(&mut state);
        drop(state);
        self.arm_timeouts(applied);
        keys.len()
    }

    /// Drop a pending or applied hint. Waiters see `Cancelled`.
    pub fn cancel_hint(&self, hint_type: HintType, url: &str) -> bool {
        let key = (hint_type, url.to_string());
        let mut state = self.inner.lock();
        let cancelled = if let Some(applied) = state.applied.remove(&key) {
            self.inner.sink.remove(&applied.hint);
            true
        } else {
            state.pending.remove(hint_type, url).is_some()
        };
        if cancelled {
            tracing::debug!(hint_type = %hint_type, url, "resource hint cancelled");
            notify(&mut state, &key, Err(HintError::Cancelled { url: url.to_string() }));
        }
        let applied = self.inner.schedule(&mut state);
        drop(state);
        self.arm_timeouts(applied);
        cancelled
    }

    /// Cancel everything and remove every applied declaration.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        let applied: Vec<Applied> = state.applied.drain().map(|(_, a)| a).collect();
        for a in &applied {
            self.inner.sink.remove(&a.hint);
        }
        let pending = state.pending.drain();
        for hint in applied.iter().map(|a| &a.hint).chain(pending.iter()) {
            let key = hint.key();
            notify(&mut state, &key, Err(HintError::Cancelled { url: hint.url.clone() }));
        }
    }

    /// Hint the resources of a route.
    ///
    /// `preload` resources are queued now and awaited; everything else is
    /// queued after the deferred delay without being awaited. Fails with the
    /// first preload that fails; the remaining preloads keep loading.
    pub async fn preload_route(&self, resources: Vec<ResourceHint>) -> Result<(), HintError> {
        let (critical, deferred): (Vec<_>, Vec<_>) = resources
            .into_iter()
            .partition(|h| h.hint_type == HintType::Preload);

        let receivers = {
            let mut state = self.inner.lock();
            let receivers: Vec<(String, oneshot::Receiver<Result<(), HintError>>)> = critical
                .into_iter()
                .map(|hint| {
                    let (tx, rx) = oneshot::channel();
                    let key = hint.key();
                    let url = hint.url.clone();
                    self.inner.enqueue(&mut state, hint);
                    state.waiters.entry(key).or_default().push(tx);
                    (url, rx)
                })
                .collect();
            let applied = self.inner.schedule(&mut state);
            drop(state);
            self.arm_timeouts(applied);
            receivers
        };

        if !deferred.is_empty() {
            let delay = self.inner.config.deferred_delay();
            let manager = self.clone();
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                manager.add_hints(deferred);
            });
        }

        let mut waits = JoinSet::new();
        for (url, rx) in receivers {
            waits.spawn(async move {
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(HintError::Cancelled { url }),
                }
            });
        }
        while let Some(joined) = waits.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "preload waiter aborted");
                }
            }
        }
        Ok(())
    }

    pub fn applied_count(&self) -> usize {
        self.inner.lock().applied.len()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_applied(&self, hint_type: HintType, url: &str) -> bool {
        self.inner
            .lock()
            .applied
            .contains_key(&(hint_type, url.to_string()))
    }

    pub fn is_pending(&self, hint_type: HintType, url: &str) -> bool {
        self.inner.lock().pending.contains(hint_type, url)
    }

    /// Applied hints, oldest application first.
    pub fn applied_hints(&self) -> Vec<ResourceHint> {
        let state = self.inner.lock();
        let mut applied: Vec<&Applied> = state.applied.values().collect();
        applied.sort_by_key(|a| a.id);
        applied.into_iter().map(|a| a.hint.clone()).collect()
    }

    fn arm_timeouts(&self, applied: Vec<(HintKey, u64)>) {
        let Some(timeout) = self.inner.config.hint_timeout() else {
            return;
        };
        if applied.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime, resource hint timeouts disabled");
            return;
        };
        for (key, id) in applied {
            let inner: Weak<Inner> = Arc::downgrade(&self.inner);
            runtime.spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(inner) = inner.upgrade() {
                    ResourceHintManager { inner }.expire(&key, id);
                }
            });
        }
    }

    fn expire(&self, key: &HintKey, id: u64) {
        let mut state = self.inner.lock();
        let current = state.applied.get(key).is_some_and(|a| a.id == id);
        if !current {
            return;
        }
        let url = key.1.clone();
        tracing::warn!(hint_type = %key.0, url = %url, "resource hint timed out");
        self.inner.resolve(&mut state, key, Err(HintError::TimedOut { url }));
        let applied = self.inner.schedule(&mut state);
        drop(state);
        self.arm_timeouts(applied);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HintState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enqueue(&self, state: &mut HintState, hint: ResourceHint) -> bool {
        if state.applied.contains_key(&hint.key()) || state.pending.contains(hint.hint_type, &hint.url) {
            return false;
        }
        state.pending.push(hint, &self.config.priorities);
        true
    }

    /// Apply pending hints up to capacity. Returns the newly applied keys.
    fn schedule(&self, state: &mut HintState) -> Vec<(HintKey, u64)> {
        let mut newly_applied = Vec::new();
        while state.applied.len() < self.config.max_concurrent_loads {
            let Some(hint) = state.pending.pop() else {
                break;
            };
            self.sink.apply(&hint);
            let id = state.next_id;
            state.next_id += 1;
            let key = hint.key();
            tracing::debug!(hint_type = %hint.hint_type, url = %hint.url, "resource hint applied");
            state.applied.insert(
                key.clone(),
                Applied {
                    hint,
                    id,
                    applied_at: Instant::now(),
                },
            );
            newly_applied.push((key, id));
        }
        newly_applied
    }

    fn resolve(&self, state: &mut HintState, key: &HintKey, outcome: Result<(), HintError>) {
        let Some(applied) = state.applied.remove(key) else {
            return;
        };
        if self.config.auto_cleanup {
            self.sink.remove(&applied.hint);
        }
        tracing::debug!(
            hint_type = %key.0,
            url = %key.1,
            ok = outcome.is_ok(),
            elapsed_ms = applied.applied_at.elapsed().as_millis() as u64,
            "resource hint resolved"
        );
        notify(state, key, outcome);
    }
}

fn notify(state: &mut HintState, key: &HintKey, outcome: Result<(), HintError>) {
    if let Some(waiters) = state.waiters.remove(key) {
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}
