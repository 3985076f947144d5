//! Structured log events for key engine operations.
//!
//! Each function emits a `tracing` event with structured fields.

use foresight_core::models::{NetworkQuality, SkipReason, TriggerMethod};

pub fn prefetch_started(path: &str, method: TriggerMethod) {
    tracing::info!(
        event = "prefetch_started",
        path = %path,
        method = %method,
        "prefetch started"
    );
}

pub fn prefetch_succeeded(path: &str, method: TriggerMethod) {
    tracing::info!(
        event = "prefetch_succeeded",
        path = %path,
        method = %method,
        "prefetch succeeded"
    );
}

pub fn prefetch_failed(path: &str, method: TriggerMethod, error: &str) {
    tracing::warn!(
        event = "prefetch_failed",
        path = %path,
        method = %method,
        error = %error,
        "prefetch failed"
    );
}

/// Log a request dropped before fetching.
pub fn prefetch_skipped(path: &str, method: TriggerMethod, reason: SkipReason) {
    tracing::debug!(
        event = "prefetch_skipped",
        path = %path,
        method = %method,
        reason = ?reason,
        "prefetch skipped"
    );
}

/// Log the predictions acted on after a navigation.
pub fn predictions_enqueued(route: &str, paths: &[String]) {
    tracing::debug!(
        event = "predictions_enqueued",
        route = %route,
        paths = ?paths,
        "predicted routes enqueued"
    );
}

pub fn offline_replayed(committed: usize, remaining: usize, quality: NetworkQuality) {
    tracing::info!(
        event = "offline_replayed",
        committed = committed,
        remaining = remaining,
        quality = %quality,
        "offline cache writes replayed"
    );
}
