use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::HintType;

/// Per-type hint priorities. Lower numbers are applied first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HintPriorities {
    pub preload: u8,
    pub preconnect: u8,
    pub prefetch: u8,
    pub dns_prefetch: u8,
}

impl HintPriorities {
    pub fn of(&self, hint_type: HintType) -> u8 {
        match hint_type {
            HintType::Preload => self.preload,
            HintType::Preconnect => self.preconnect,
            HintType::Prefetch => self.prefetch,
            HintType::DnsPrefetch => self.dns_prefetch,
        }
    }
}

impl Default for HintPriorities {
    fn default() -> Self {
        Self {
            preload: defaults::DEFAULT_PRELOAD_PRIORITY,
            preconnect: defaults::DEFAULT_PRECONNECT_PRIORITY,
            prefetch: defaults::DEFAULT_PREFETCH_PRIORITY,
            dns_prefetch: defaults::DEFAULT_DNS_PREFETCH_PRIORITY,
        }
    }
}

/// Resource hint manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    pub max_concurrent_loads: usize,
    pub priorities: HintPriorities,
    /// Remove declarations from the document once their resource completes.
    pub auto_cleanup: bool,
    /// Applied hints that never complete are retired after this long. `0` disables.
    pub hint_timeout_ms: u64,
    /// Delay before non-critical resources of a route preload are hinted.
    pub deferred_delay_ms: u64,
}

impl HintConfig {
    pub fn hint_timeout(&self) -> Option<Duration> {
        (self.hint_timeout_ms > 0).then(|| Duration::from_millis(self.hint_timeout_ms))
    }

    pub fn deferred_delay(&self) -> Duration {
        Duration::from_millis(self.deferred_delay_ms)
    }
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: defaults::DEFAULT_MAX_CONCURRENT_LOADS,
            priorities: HintPriorities::default(),
            auto_cleanup: defaults::DEFAULT_AUTO_CLEANUP,
            hint_timeout_ms: defaults::DEFAULT_HINT_TIMEOUT_MS,
            deferred_delay_ms: defaults::DEFAULT_DEFERRED_DELAY_MS,
        }
    }
}
