use serde::{Deserialize, Serialize};

use super::defaults;

/// Route transition model configuration.
///
/// The weights are empirical tuning values; they are defaults, not invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Routes not visited for this many days are ignored and pruned.
    pub max_age_days: u32,
    /// Destinations visited within this window get the blended score.
    pub recency_window_secs: u64,
    /// Visit count at which the popularity boost saturates.
    pub visit_cap: u64,
    pub transition_weight: f64,
    pub visit_weight: f64,
    pub recency_weight: f64,
    /// Key under which the stats table is persisted.
    pub storage_key: String,
    /// TTL of memoised predictions (seconds).
    pub cache_ttl_secs: u64,
}

impl PredictionConfig {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.max_age_days.min(defaults::MAX_AGE_DAYS_LIMIT)))
    }

    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.recency_window_secs.min(defaults::MAX_RECENCY_WINDOW_SECS) as i64)
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            max_age_days: defaults::DEFAULT_MAX_AGE_DAYS,
            recency_window_secs: defaults::DEFAULT_RECENCY_WINDOW_SECS,
            visit_cap: defaults::DEFAULT_VISIT_CAP,
            transition_weight: defaults::DEFAULT_TRANSITION_WEIGHT,
            visit_weight: defaults::DEFAULT_VISIT_WEIGHT,
            recency_weight: defaults::DEFAULT_RECENCY_WEIGHT,
            storage_key: crate::constants::ROUTE_STATS_KEY.to_string(),
            cache_ttl_secs: defaults::DEFAULT_PREDICTION_CACHE_TTL_SECS,
        }
    }
}
