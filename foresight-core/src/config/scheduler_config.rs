use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::{NetworkQuality, TriggerMethod};

/// Minimum network tier each trigger method requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodThresholds {
    pub hover: NetworkQuality,
    pub viewport: NetworkQuality,
    pub prediction: NetworkQuality,
    pub manual: NetworkQuality,
}

impl MethodThresholds {
    pub fn required(&self, method: TriggerMethod) -> NetworkQuality {
        match method {
            TriggerMethod::Hover => self.hover,
            TriggerMethod::Viewport => self.viewport,
            TriggerMethod::Prediction => self.prediction,
            TriggerMethod::Manual => self.manual,
        }
    }
}

impl Default for MethodThresholds {
    fn default() -> Self {
        Self {
            hover: NetworkQuality::Fast,
            viewport: NetworkQuality::Medium,
            prediction: NetworkQuality::Slow,
            manual: NetworkQuality::Slow,
        }
    }
}

/// Prefetch scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub thresholds: MethodThresholds,
    pub hover_delay_ms: u64,
    pub prediction_settle_delay_ms: u64,
    /// Predictions scoring below this are not prefetched.
    pub prediction_threshold: f64,
    /// Maximum predictions prefetched per navigation.
    pub max_prefetch_count: usize,
    pub max_concurrent_prefetches: usize,
    pub prefetch_timeout_ms: u64,
    /// Minimum intersection ratio for a viewport trigger.
    pub viewport_threshold: f64,
    pub max_prefetches_per_minute: usize,
    /// Origin used to resolve paths for the default HTTP fetch strategy and to
    /// recognise same-origin anchors.
    pub origin: Option<String>,
}

impl SchedulerConfig {
    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    pub fn prediction_settle_delay(&self) -> Duration {
        Duration::from_millis(self.prediction_settle_delay_ms)
    }

    pub fn prefetch_timeout(&self) -> Duration {
        Duration::from_millis(self.prefetch_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thresholds: MethodThresholds::default(),
            hover_delay_ms: defaults::DEFAULT_HOVER_DELAY_MS,
            prediction_settle_delay_ms: defaults::DEFAULT_PREDICTION_SETTLE_DELAY_MS,
            prediction_threshold: defaults::DEFAULT_PREDICTION_THRESHOLD,
            max_prefetch_count: defaults::DEFAULT_MAX_PREFETCH_COUNT,
            max_concurrent_prefetches: defaults::DEFAULT_MAX_CONCURRENT_PREFETCHES,
            prefetch_timeout_ms: defaults::DEFAULT_PREFETCH_TIMEOUT_MS,
            viewport_threshold: defaults::DEFAULT_VIEWPORT_THRESHOLD,
            max_prefetches_per_minute: defaults::DEFAULT_MAX_PREFETCHES_PER_MINUTE,
            origin: None,
        }
    }
}
