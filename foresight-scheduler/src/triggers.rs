//! Trigger adapters: hover debounce, viewport visibility and navigation.

use foresight_core::models::{PrefetchState, TriggerMethod};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::handle::PrefetchHandle;
use crate::scheduler::PrefetchScheduler;
use crate::tracing_setup::events;

/// One visibility observation of an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub href: String,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn visible(href: impl Into<String>, intersection_ratio: f64) -> Self {
        Self {
            href: href.into(),
            intersection_ratio,
            is_intersecting: true,
        }
    }
}

impl PrefetchScheduler {
    /// Pointer entered (or touch started on) a link to `path`.
    ///
    /// The prefetch fires after the hover delay unless `hover_end` comes
    /// first. Re-hovering a path whose timer is armed is a no-op.
    pub fn hover_start(&self, path: &str) {
        let mut state = self.inner.lock();
        if state.hover_timers.contains_key(path)
            || state.paths.get(path) == Some(&PrefetchState::Resolved)
        {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let scheduler = self.clone();
        let owned = path.to_string();
        let delay = self.inner.config.hover_delay();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.inner.lock().hover_timers.remove(&owned);
            scheduler.prefetch(&owned, TriggerMethod::Hover);
        });
        state.hover_timers.insert(path.to_string(), timer);
    }

    /// Pointer left the link. Returns whether a pending timer was cancelled.
    pub fn hover_end(&self, path: &str) -> bool {
        match self.inner.lock().hover_timers.remove(path) {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn pending_hovers(&self) -> usize {
        self.inner.lock().hover_timers.len()
    }

    /// Prefetch same-origin anchors that became sufficiently visible.
    pub fn observe_intersections(&self, entries: &[IntersectionEntry]) -> Vec<PrefetchHandle> {
        let threshold = self.inner.config.viewport_threshold;
        entries
            .iter()
            .filter(|e| e.is_intersecting && e.intersection_ratio >= threshold)
            .filter_map(|e| self.same_origin_path(&e.href))
            .map(|path| self.prefetch(&path, TriggerMethod::Viewport))
            .collect()
    }

    /// The path part of `href` if it points at this origin.
    pub fn same_origin_path(&self, href: &str) -> Option<String> {
        let href = href.split('#').next().unwrap_or_default();
        if href.starts_with("//") {
            return None;
        }
        if href.starts_with('/') {
            return Some(href.to_string());
        }
        let origin = self.inner.config.origin.as_deref()?.trim_end_matches('/');
        let rest = href.strip_prefix(origin)?;
        match rest.chars().next() {
            None => Some("/".to_string()),
            Some('/') => Some(rest.to_string()),
            Some('?') => Some(format!("/{rest}")),
            Some(_) => None,
        }
    }

    /// Navigation to `path` happened.
    ///
    /// Updates the model and the current route, then after the settle delay
    /// prefetches the best predictions unless another navigation intervened.
    pub fn record_visit(&self, path: &str) {
        self.inner.parts.predictor.record_visit(path);

        let mut state = self.inner.lock();
        state.current_route = Some(path.to_string());
        if let Some(previous) = state.prediction_task.take() {
            previous.abort();
        }
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let scheduler = self.clone();
        let route = path.to_string();
        let delay = self.inner.config.prediction_settle_delay();
        state.prediction_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.prefetch_predictions(&route);
        }));
    }

    /// Prefetch predicted next routes from `route` right away.
    ///
    /// Does nothing if `route` is no longer the current route.
    pub fn prefetch_predictions(&self, route: &str) -> Vec<PrefetchHandle> {
        if self.inner.lock().current_route.as_deref() != Some(route) {
            return Vec::new();
        }
        let config = &self.inner.config;
        let is_prefetched = |p: &str| self.is_prefetched(p);
        let selected: Vec<String> = self
            .inner
            .parts
            .predictor
            .predict(route, &is_prefetched)
            .into_iter()
            .filter(|s| s.score >= config.prediction_threshold)
            .take(config.max_prefetch_count)
            .map(|s| s.path)
            .collect();
        if selected.is_empty() {
            return Vec::new();
        }
        events::predictions_enqueued(route, &selected);
        selected
            .iter()
            .map(|path| self.prefetch(path, TriggerMethod::Prediction))
            .collect()
    }
}
