/// Foresight engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage key under which the route transition table is persisted.
pub const ROUTE_STATS_KEY: &str = "foresight.route_stats";

/// Length of the sliding window used by the prefetch rate limiter.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Upper bound on routes kept in the transition table before pruning kicks in.
pub const MAX_TRACKED_ROUTES: usize = 5_000;
