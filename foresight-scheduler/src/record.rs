use chrono::{DateTime, Utc};
use foresight_core::models::{PrefetchState, TriggerMethod};
use serde::{Deserialize, Serialize};

/// Cache record kept for a prefetched path.
///
/// Written as `InFlight` when the fetch starts, rewritten as `Resolved` when
/// it succeeds, deleted when it fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchRecord {
    pub path: String,
    pub method: TriggerMethod,
    pub state: PrefetchState,
    pub started_at: DateTime<Utc>,
}
