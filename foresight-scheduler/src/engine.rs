//! ForesightEngine: builds and wires every subsystem from one config.

use std::sync::{Arc, Mutex};

use foresight_cache::{create_backend, ICacheBackend, TieredCache};
use foresight_core::config::ForesightConfig;
use foresight_core::errors::{ConfigError, ForesightResult, HintError};
use foresight_core::models::{NetworkQuality, ResourceHint};
use foresight_core::traits::{
    IClock, IConnectivity, IFetchStrategy, IHintSink, IKeyValueStore, ITelemetry, SystemClock,
};
use foresight_hints::ResourceHintManager;
use foresight_network::{NetworkMonitor, NetworkQualityClassifier};
use foresight_prediction::RouteTransitionPredictor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::fetch::HttpFetchStrategy;
use crate::handle::PrefetchHandle;
use crate::record::PrefetchRecord;
use crate::scheduler::{PrefetchScheduler, SchedulerParts};
use crate::telemetry::TracingTelemetry;
use crate::tracing_setup::events;
use crate::triggers::IntersectionEntry;

const RECORD_NAMESPACE: &str = "prefetch:";
const DOCUMENT_NAMESPACE: &str = "document:";

/// What the host environment provides.
pub struct EngineHost {
    pub connectivity: Arc<dyn IConnectivity>,
    pub hint_sink: Arc<dyn IHintSink>,
    /// Persistent store for the route model and key/value cache backend.
    pub store: Option<Arc<dyn IKeyValueStore>>,
    /// Overrides the default HTTP strategy.
    pub fetch: Option<Arc<dyn IFetchStrategy>>,
    pub telemetry: Arc<dyn ITelemetry>,
    pub clock: Arc<dyn IClock>,
}

impl EngineHost {
    pub fn new(connectivity: Arc<dyn IConnectivity>, hint_sink: Arc<dyn IHintSink>) -> Self {
        Self {
            connectivity,
            hint_sink,
            store: None,
            fetch: None,
            telemetry: Arc::new(TracingTelemetry),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn IKeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_fetch(mut self, fetch: Arc<dyn IFetchStrategy>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn ITelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn IClock>) -> Self {
        self.clock = clock;
        self
    }
}

fn namespaced_cache<T>(
    config: &ForesightConfig,
    backend: &Arc<dyn ICacheBackend>,
    host: &EngineHost,
    namespace: &str,
) -> Result<TieredCache<T>, ConfigError>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    Ok(TieredCache::new(config.cache.clone(), Arc::clone(backend))?
        .with_namespace(namespace)
        .with_clock(Arc::clone(&host.clock))
        .with_connectivity(Arc::clone(&host.connectivity))
        .with_telemetry(Arc::clone(&host.telemetry)))
}

/// The assembled engine.
pub struct ForesightEngine {
    config: ForesightConfig,
    network: Arc<NetworkMonitor>,
    predictor: Arc<RouteTransitionPredictor>,
    records: Arc<TieredCache<PrefetchRecord>>,
    documents: Option<Arc<TieredCache<String>>>,
    hints: ResourceHintManager,
    scheduler: PrefetchScheduler,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl ForesightEngine {
    /// Validate `config` and build every subsystem. Nothing runs until
    /// `start`.
    pub fn new(config: ForesightConfig, mut host: EngineHost) -> ForesightResult<Self> {
        config.validate()?;

        let classifier = NetworkQualityClassifier::new(config.network.clone())?;
        let network = Arc::new(NetworkMonitor::new(classifier, Arc::clone(&host.connectivity)));
        let predictor = Arc::new(RouteTransitionPredictor::new(
            config.prediction.clone(),
            host.store.clone(),
            Arc::clone(&host.clock),
        )?);

        let backend = create_backend(&config.cache, host.store.clone())?;
        let records: Arc<TieredCache<PrefetchRecord>> =
            Arc::new(namespaced_cache(&config, &backend, &host, RECORD_NAMESPACE)?);

        let (fetch, documents): (Arc<dyn IFetchStrategy>, _) = match host.fetch.take() {
            Some(fetch) => (fetch, None),
            None => {
                let origin = config
                    .scheduler
                    .origin
                    .clone()
                    .ok_or(ConfigError::MissingFetchStrategy)?;
                let documents: Arc<TieredCache<String>> =
                    Arc::new(namespaced_cache(&config, &backend, &host, DOCUMENT_NAMESPACE)?);
                let http = HttpFetchStrategy::new(origin)?.with_document_cache(Arc::clone(&documents));
                (Arc::new(http), Some(documents))
            }
        };

        let hints = ResourceHintManager::new(config.hints.clone(), host.hint_sink)?;
        let scheduler = PrefetchScheduler::new(
            config.scheduler.clone(),
            SchedulerParts {
                network: Arc::clone(&network),
                predictor: Arc::clone(&predictor),
                fetch,
                records: Some(Arc::clone(&records)),
                hints: Some(hints.clone()),
                telemetry: host.telemetry,
            },
        )?;

        tracing::info!(
            version = foresight_core::constants::VERSION,
            backend = records.backend_name(),
            quality = %network.current(),
            "foresight engine ready"
        );
        Ok(Self {
            config,
            network,
            predictor,
            records,
            documents,
            hints,
            scheduler,
            background: Mutex::new(Vec::new()),
        })
    }

    /// Start connectivity polling and offline replay on reconnect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let poller = self.network.spawn_polling(self.config.network.poll_interval());

        let mut changes = self.network.subscribe();
        let records = Arc::clone(&self.records);
        let documents = self.documents.clone();
        let replayer = tokio::spawn(async move {
            let mut previous = *changes.borrow_and_update();
            while changes.changed().await.is_ok() {
                let quality = *changes.borrow_and_update();
                let reconnected = previous == NetworkQuality::Offline && quality != NetworkQuality::Offline;
                previous = quality;
                if !reconnected {
                    continue;
                }
                if let Some(report) = records.on_connectivity_change(true).await {
                    events::offline_replayed(report.committed, report.remaining, quality);
                }
                if let Some(documents) = &documents {
                    if let Some(report) = documents.on_connectivity_change(true).await {
                        events::offline_replayed(report.committed, report.remaining, quality);
                    }
                }
            }
        });

        let mut background = self.background.lock().unwrap_or_else(|e| e.into_inner());
        background.push(poller);
        background.push(replayer);
    }

    /// Stop background tasks and timers, and withdraw every hint.
    pub fn shutdown(&self) {
        let mut background = self.background.lock().unwrap_or_else(|e| e.into_inner());
        for task in background.drain(..) {
            task.abort();
        }
        self.scheduler.shutdown();
        self.hints.clear();
    }

    pub fn record_visit(&self, path: &str) {
        self.scheduler.record_visit(path);
    }

    pub fn hover_start(&self, path: &str) {
        self.scheduler.hover_start(path);
    }

    pub fn hover_end(&self, path: &str) -> bool {
        self.scheduler.hover_end(path)
    }

    pub fn observe_intersections(&self, entries: &[IntersectionEntry]) -> Vec<PrefetchHandle> {
        self.scheduler.observe_intersections(entries)
    }

    pub fn prefetch_manual(&self, path: &str) -> PrefetchHandle {
        self.scheduler.prefetch_manual(path)
    }

    pub async fn preload_route(&self, resources: Vec<ResourceHint>) -> Result<(), HintError> {
        self.hints.preload_route(resources).await
    }

    pub fn on_resource_complete(&self, url: &str) -> usize {
        self.hints.on_resource_complete(url)
    }

    pub fn on_resource_failed(&self, url: &str) -> usize {
        self.hints.on_resource_failed(url)
    }

    /// A prefetched document body, if the default HTTP strategy cached one.
    pub async fn cached_document(&self, path: &str) -> Option<String> {
        let documents = self.documents.as_ref()?;
        match documents.get(path).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path, error = %e, "failed to read cached document");
                None
            }
        }
    }

    pub fn config(&self) -> &ForesightConfig {
        &self.config
    }

    pub fn network(&self) -> &Arc<NetworkMonitor> {
        &self.network
    }

    pub fn predictor(&self) -> &Arc<RouteTransitionPredictor> {
        &self.predictor
    }

    pub fn records(&self) -> &Arc<TieredCache<PrefetchRecord>> {
        &self.records
    }

    pub fn hints(&self) -> &ResourceHintManager {
        &self.hints
    }

    pub fn scheduler(&self) -> &PrefetchScheduler {
        &self.scheduler
    }
}
