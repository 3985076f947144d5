//! Shared fixtures for Foresight integration tests: golden data files and
//! recording/failing implementations of the host-facing traits.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use foresight_core::errors::{FetchError, ForesightResult, StorageError};
use foresight_core::models::{ResourceHint, TriggerMethod};
use foresight_core::traits::{IFetchStrategy, IHintSink, IKeyValueStore, ITelemetry};
use serde::de::DeserializeOwned;

/// Root directory of the test-fixtures folder.
fn fixtures_root() -> PathBuf {
    // Works from any crate in the workspace: walk up to find test-fixtures.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let raw = load_fixture_raw(relative_path);
    serde_json::from_str(&raw)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {relative_path}: {e}"))
}

/// Load a fixture file as a raw string.
pub fn load_fixture_raw(relative_path: &str) -> String {
    let path = fixtures_root().join(relative_path);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

// ── Key/value store ────────────────────────────────────────────────────────

/// In-memory `IKeyValueStore` with switchable write failures, globally or
/// per key.
#[derive(Default)]
pub struct InMemoryStore {
    items: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
    failing_keys: Mutex<HashSet<String>>,
    writes: AtomicUsize,
    write_log: Mutex<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.items.lock().unwrap().insert(key.into(), value.into());
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail every write to `key` until `heal_key`.
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn heal_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().remove(key);
    }

    /// Keys of successful writes, in commit order.
    pub fn write_log(&self) -> Vec<String> {
        self.write_log.lock().unwrap().clone()
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.lock().unwrap().get(key).cloned()
    }
}

impl IKeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> ForesightResult<Option<String>> {
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> ForesightResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::Backend {
                backend: "in-memory".into(),
                message: "injected write failure".into(),
            }
            .into());
        }
        self.items.lock().unwrap().insert(key.into(), value.into());
        self.write_log.lock().unwrap().push(key.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> ForesightResult<()> {
        self.items.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        Ok(self.items.lock().unwrap().keys().cloned().collect())
    }
}

// ── Fetch strategy ─────────────────────────────────────────────────────────

/// Records every fetch; paths can be made to fail or hang.
#[derive(Default)]
pub struct RecordingFetch {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    latency: Mutex<Option<Duration>>,
}

impl RecordingFetch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch sleeps this long before resolving.
    pub fn with_latency(latency: Duration) -> Self {
        let fetch = Self::default();
        *fetch.latency.lock().unwrap() = Some(latency);
        fetch
    }

    pub fn fail_path(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    pub fn heal_path(&self, path: &str) {
        self.failing.lock().unwrap().remove(path);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl IFetchStrategy for RecordingFetch {
    async fn fetch(&self, path: &str) -> ForesightResult<()> {
        self.calls.lock().unwrap().push(path.to_string());
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.lock().unwrap().contains(path) {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: 500,
            }
            .into());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ── Hint sink ──────────────────────────────────────────────────────────────

/// A fake document that tracks which hint declarations are present.
#[derive(Default)]
pub struct RecordingHintSink {
    present: Mutex<Vec<ResourceHint>>,
    applied: Mutex<Vec<ResourceHint>>,
    removed: Mutex<Vec<ResourceHint>>,
}

impl RecordingHintSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declarations currently in the document.
    pub fn present(&self) -> Vec<ResourceHint> {
        self.present.lock().unwrap().clone()
    }

    pub fn present_urls(&self) -> Vec<String> {
        self.present().into_iter().map(|h| h.url).collect()
    }

    /// Every hint ever applied, in order.
    pub fn applied(&self) -> Vec<ResourceHint> {
        self.applied.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<ResourceHint> {
        self.removed.lock().unwrap().clone()
    }
}

impl IHintSink for RecordingHintSink {
    fn apply(&self, hint: &ResourceHint) {
        self.present.lock().unwrap().push(hint.clone());
        self.applied.lock().unwrap().push(hint.clone());
    }

    fn remove(&self, hint: &ResourceHint) {
        self.present.lock().unwrap().retain(|h| h != hint);
        self.removed.lock().unwrap().push(hint.clone());
    }
}

// ── Telemetry ──────────────────────────────────────────────────────────────

/// A telemetry event as seen by `RecordingTelemetry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    PrefetchStart(String, TriggerMethod),
    PrefetchSuccess(String, TriggerMethod),
    PrefetchError(String, TriggerMethod),
    CacheHit(String),
    CacheMiss(String),
}

/// Collects telemetry callbacks.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&TelemetryEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl ITelemetry for RecordingTelemetry {
    fn on_prefetch_start(&self, path: &str, method: TriggerMethod) {
        self.events
            .lock()
            .unwrap()
            .push(TelemetryEvent::PrefetchStart(path.into(), method));
    }

    fn on_prefetch_success(&self, path: &str, method: TriggerMethod) {
        self.events
            .lock()
            .unwrap()
            .push(TelemetryEvent::PrefetchSuccess(path.into(), method));
    }

    fn on_prefetch_error(&self, path: &str, method: TriggerMethod, _error: &str) {
        self.events
            .lock()
            .unwrap()
            .push(TelemetryEvent::PrefetchError(path.into(), method));
    }

    fn on_cache_hit(&self, key: &str) {
        self.events.lock().unwrap().push(TelemetryEvent::CacheHit(key.into()));
    }

    fn on_cache_miss(&self, key: &str) {
        self.events.lock().unwrap().push(TelemetryEvent::CacheMiss(key.into()));
    }
}
