use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused a prefetch to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMethod {
    Hover,
    Viewport,
    Prediction,
    Manual,
}

impl TriggerMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Viewport => "viewport",
            Self::Prediction => "prediction",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prefetch request waiting for (or holding) an execution slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefetchQueueItem {
    pub path: String,
    pub trigger: TriggerMethod,
    pub enqueued_at: DateTime<Utc>,
}

/// Per-path prefetch lifecycle. `Failed` is transient: the path returns to
/// `Idle` as soon as the failure is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchState {
    Idle,
    Queued,
    InFlight,
    Resolved,
    Failed,
}

/// Why a prefetch request was dropped without fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    CurrentRoute,
    AlreadyPrefetched,
    InFlight,
    NetworkTooSlow,
    RateLimited,
}

/// Final outcome of one prefetch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefetchOutcome {
    Prefetched,
    Skipped(SkipReason),
    Failed(String),
}

impl PrefetchOutcome {
    pub fn is_prefetched(&self) -> bool {
        matches!(self, Self::Prefetched)
    }
}
