use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Visit and transition statistics for one route path.
///
/// `transitions` never holds an entry for `path` itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStats {
    pub path: String,
    pub visits: u64,
    pub last_visit: DateTime<Utc>,
    /// Destination path → number of observed transitions from `path`.
    pub transitions: BTreeMap<String, u64>,
}

impl RouteStats {
    /// Stats for a route seen for the first time at `now`, with zero visits.
    pub fn new(path: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            visits: 0,
            last_visit: now,
            transitions: BTreeMap::new(),
        }
    }

    pub fn record_visit(&mut self, now: DateTime<Utc>) {
        self.visits += 1;
        self.last_visit = now;
    }

    /// Count a transition to `destination`. Self-loops are ignored.
    /// Returns whether a transition was recorded.
    pub fn record_transition(&mut self, destination: &str) -> bool {
        if destination == self.path {
            return false;
        }
        *self.transitions.entry(destination.to_string()).or_insert(0) += 1;
        true
    }

    /// Sum of all outgoing transition counts.
    pub fn total_transitions(&self) -> u64 {
        self.transitions.values().sum()
    }

    /// Whether the last visit is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.last_visit > max_age
    }
}

/// A scored next-route candidate. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionScore {
    pub path: String,
    /// Score in `[0.0, 1.0]`.
    pub score: f64,
}
