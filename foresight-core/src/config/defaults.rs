// Single source of truth for all default values.

// --- Network ---
pub const DEFAULT_FAST_MIN_DOWNLINK_MBPS: f64 = 5.0;
pub const DEFAULT_FAST_MAX_RTT_MS: u32 = 100;
pub const DEFAULT_SLOW_MAX_DOWNLINK_MBPS: f64 = 0.5;
pub const DEFAULT_SLOW_MIN_RTT_MS: u32 = 600;
pub const DEFAULT_NETWORK_POLL_INTERVAL_SECS: u64 = 10;

// --- Prediction ---
pub const DEFAULT_MAX_AGE_DAYS: u32 = 30;
pub const DEFAULT_RECENCY_WINDOW_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_VISIT_CAP: u64 = 10;
pub const DEFAULT_TRANSITION_WEIGHT: f64 = 0.7;
pub const DEFAULT_VISIT_WEIGHT: f64 = 0.2;
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.1;
pub const DEFAULT_PREDICTION_CACHE_TTL_SECS: u64 = 60;
pub const MAX_AGE_DAYS_LIMIT: u32 = 3_650;
pub const MAX_RECENCY_WINDOW_SECS: u64 = 315_360_000; // 10 years

// --- Cache ---
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
pub const MAX_CACHE_TTL_SECS: u64 = 315_360_000; // 10 years
pub const DEFAULT_CACHE_MAX_ITEMS: usize = 500;
pub const DEFAULT_CACHE_VERSION: &str = "1";
pub const DEFAULT_CACHE_KEY_PREFIX: &str = "foresight.cache.";
pub const DEFAULT_CACHE_DB_FILENAME: &str = "foresight-cache.db";
pub const DEFAULT_OFFLINE_QUEUE: bool = true;
pub const DEFAULT_COMPRESS: bool = false;

// --- Resource hints ---
pub const DEFAULT_MAX_CONCURRENT_LOADS: usize = 6;
pub const DEFAULT_AUTO_CLEANUP: bool = true;
pub const DEFAULT_HINT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DEFERRED_DELAY_MS: u64 = 50;
pub const DEFAULT_PRELOAD_PRIORITY: u8 = 1;
pub const DEFAULT_PRECONNECT_PRIORITY: u8 = 2;
pub const DEFAULT_PREFETCH_PRIORITY: u8 = 3;
pub const DEFAULT_DNS_PREFETCH_PRIORITY: u8 = 4;

// --- Scheduler ---
pub const DEFAULT_HOVER_DELAY_MS: u64 = 100;
pub const DEFAULT_PREDICTION_SETTLE_DELAY_MS: u64 = 300;
pub const DEFAULT_PREDICTION_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MAX_PREFETCH_COUNT: usize = 3;
pub const DEFAULT_MAX_CONCURRENT_PREFETCHES: usize = 4;
pub const DEFAULT_PREFETCH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_VIEWPORT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MAX_PREFETCHES_PER_MINUTE: usize = 30;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
