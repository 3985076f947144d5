//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.
//! `validate()` rejects values that would make the engine misbehave; it runs
//! at construction time and is the only place configuration mistakes surface.

pub mod cache_config;
pub mod defaults;
pub mod hint_config;
pub mod network_config;
pub mod observability_config;
pub mod prediction_config;
pub mod scheduler_config;

pub use cache_config::{CacheBackendKind, CacheConfig, InvalidationStrategy};
pub use hint_config::{HintConfig, HintPriorities};
pub use network_config::NetworkConfig;
pub use observability_config::ObservabilityConfig;
pub use prediction_config::PredictionConfig;
pub use scheduler_config::{MethodThresholds, SchedulerConfig};

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ForesightResult};

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForesightConfig {
    pub network: NetworkConfig,
    pub prediction: PredictionConfig,
    pub cache: CacheConfig,
    pub hints: HintConfig,
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

impl ForesightConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(source: &str) -> ForesightResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_network(&self.network)?;
        validate_prediction(&self.prediction)?;
        validate_cache(&self.cache)?;
        validate_hints(&self.hints)?;
        validate_scheduler(&self.scheduler)?;
        Ok(())
    }
}

fn unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(field, format!("{value} is outside [0, 1]")));
    }
    Ok(())
}

fn at_least_one(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be at least 1"));
    }
    Ok(())
}

pub fn validate_network(config: &NetworkConfig) -> Result<(), ConfigError> {
    if !(config.slow_max_downlink_mbps >= 0.0) {
        return Err(ConfigError::invalid(
            "network.slow_max_downlink_mbps",
            "must be non-negative",
        ));
    }
    if !(config.fast_min_downlink_mbps > config.slow_max_downlink_mbps) {
        return Err(ConfigError::invalid(
            "network.fast_min_downlink_mbps",
            "must exceed slow_max_downlink_mbps",
        ));
    }
    if config.fast_max_rtt_ms >= config.slow_min_rtt_ms {
        return Err(ConfigError::invalid(
            "network.fast_max_rtt_ms",
            "must be below slow_min_rtt_ms",
        ));
    }
    if config.poll_interval_secs == 0 {
        return Err(ConfigError::invalid(
            "network.poll_interval_secs",
            "must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_prediction(config: &PredictionConfig) -> Result<(), ConfigError> {
    if config.max_age_days == 0 {
        return Err(ConfigError::invalid("prediction.max_age_days", "must be at least 1"));
    }
    if config.max_age_days > defaults::MAX_AGE_DAYS_LIMIT {
        return Err(ConfigError::invalid(
            "prediction.max_age_days",
            format!("must be at most {}", defaults::MAX_AGE_DAYS_LIMIT),
        ));
    }
    if config.recency_window_secs > defaults::MAX_RECENCY_WINDOW_SECS {
        return Err(ConfigError::invalid(
            "prediction.recency_window_secs",
            format!("must be at most {}", defaults::MAX_RECENCY_WINDOW_SECS),
        ));
    }
    if config.cache_ttl_secs > defaults::MAX_CACHE_TTL_SECS {
        return Err(ConfigError::invalid(
            "prediction.cache_ttl_secs",
            format!("must be at most {}", defaults::MAX_CACHE_TTL_SECS),
        ));
    }
    if config.visit_cap == 0 {
        return Err(ConfigError::invalid("prediction.visit_cap", "must be at least 1"));
    }
    for (field, weight) in [
        ("prediction.transition_weight", config.transition_weight),
        ("prediction.visit_weight", config.visit_weight),
        ("prediction.recency_weight", config.recency_weight),
    ] {
        unit_interval(field, weight)?;
    }
    let total = config.transition_weight + config.visit_weight + config.recency_weight;
    if total <= 0.0 || total > 1.0 + f64::EPSILON * 4.0 {
        return Err(ConfigError::invalid(
            "prediction weights",
            format!("weights must sum to a value in (0, 1], got {total}"),
        ));
    }
    if config.storage_key.is_empty() {
        return Err(ConfigError::invalid("prediction.storage_key", "must not be empty"));
    }
    Ok(())
}

pub fn validate_cache(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_secs == 0 {
        return Err(ConfigError::invalid("cache.ttl_secs", "must be at least 1"));
    }
    if config.ttl_secs > defaults::MAX_CACHE_TTL_SECS {
        return Err(ConfigError::invalid(
            "cache.ttl_secs",
            format!("must be at most {}", defaults::MAX_CACHE_TTL_SECS),
        ));
    }
    if let Some(max) = config.max_items {
        at_least_one("cache.max_items", max)?;
    }
    if config.version.is_empty() {
        return Err(ConfigError::invalid("cache.version", "must not be empty"));
    }
    if config.backend == CacheBackendKind::Sqlite && config.db_path.is_empty() {
        return Err(ConfigError::invalid(
            "cache.db_path",
            "required for the sqlite backend",
        ));
    }
    Ok(())
}

pub fn validate_hints(config: &HintConfig) -> Result<(), ConfigError> {
    at_least_one("hints.max_concurrent_loads", config.max_concurrent_loads)
}

pub fn validate_scheduler(config: &SchedulerConfig) -> Result<(), ConfigError> {
    unit_interval("scheduler.prediction_threshold", config.prediction_threshold)?;
    unit_interval("scheduler.viewport_threshold", config.viewport_threshold)?;
    at_least_one("scheduler.max_prefetch_count", config.max_prefetch_count)?;
    at_least_one(
        "scheduler.max_concurrent_prefetches",
        config.max_concurrent_prefetches,
    )?;
    at_least_one(
        "scheduler.max_prefetches_per_minute",
        config.max_prefetches_per_minute,
    )?;
    if config.prefetch_timeout_ms == 0 {
        return Err(ConfigError::invalid(
            "scheduler.prefetch_timeout_ms",
            "must be at least 1",
        ));
    }
    if let Some(origin) = &config.origin {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "scheduler.origin",
                format!("{origin} is not an http(s) origin"),
            ));
        }
    }
    Ok(())
}
