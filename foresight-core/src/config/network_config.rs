use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Thresholds for network quality classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Downlink (Mbps) at or above which a 4g link may count as fast.
    pub fast_min_downlink_mbps: f64,
    /// RTT (ms) at or below which a 4g link may count as fast.
    pub fast_max_rtt_ms: u32,
    /// Downlink (Mbps) below which the link is slow.
    pub slow_max_downlink_mbps: f64,
    /// RTT (ms) above which the link is slow.
    pub slow_min_rtt_ms: u32,
    /// Re-poll interval for the network monitor (seconds).
    pub poll_interval_secs: u64,
}

impl NetworkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fast_min_downlink_mbps: defaults::DEFAULT_FAST_MIN_DOWNLINK_MBPS,
            fast_max_rtt_ms: defaults::DEFAULT_FAST_MAX_RTT_MS,
            slow_max_downlink_mbps: defaults::DEFAULT_SLOW_MAX_DOWNLINK_MBPS,
            slow_min_rtt_ms: defaults::DEFAULT_SLOW_MIN_RTT_MS,
            poll_interval_secs: defaults::DEFAULT_NETWORK_POLL_INTERVAL_SECS,
        }
    }
}
