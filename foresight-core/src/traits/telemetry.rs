use crate::models::TriggerMethod;

/// Observability callbacks. Side-effecting only; the engine never branches
/// on anything a telemetry sink does.
pub trait ITelemetry: Send + Sync {
    fn on_prefetch_start(&self, _path: &str, _method: TriggerMethod) {}
    fn on_prefetch_success(&self, _path: &str, _method: TriggerMethod) {}
    fn on_prefetch_error(&self, _path: &str, _method: TriggerMethod, _error: &str) {}
    fn on_cache_hit(&self, _key: &str) {}
    fn on_cache_miss(&self, _key: &str) {}
}

/// Telemetry sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl ITelemetry for NoopTelemetry {}
