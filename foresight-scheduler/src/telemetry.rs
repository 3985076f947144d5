use foresight_core::models::TriggerMethod;
use foresight_core::traits::ITelemetry;

use crate::tracing_setup::events;

/// Telemetry sink that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl ITelemetry for TracingTelemetry {
    fn on_prefetch_start(&self, path: &str, method: TriggerMethod) {
        events::prefetch_started(path, method);
    }

    fn on_prefetch_success(&self, path: &str, method: TriggerMethod) {
        events::prefetch_succeeded(path, method);
    }

    fn on_prefetch_error(&self, path: &str, method: TriggerMethod, error: &str) {
        events::prefetch_failed(path, method, error);
    }

    fn on_cache_hit(&self, key: &str) {
        tracing::debug!(event = "cache_hit", key = %key, "cache hit");
    }

    fn on_cache_miss(&self, key: &str) {
        tracing::debug!(event = "cache_miss", key = %key, "cache miss");
    }
}
