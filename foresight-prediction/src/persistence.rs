//! Wire format for the persisted transition table.
//!
//! The table is stored as a JSON array of
//! `{ "path", "visits", "lastVisit", "transitions": [[dest, count], ...] }`
//! with `lastVisit` in epoch milliseconds. This module is the only place that
//! knows about that shape; the predictor works with `RouteStats` maps.
//!
//! Decoding is tolerant: a malformed document yields an empty table and a
//! malformed record is skipped, so bad data never blocks initialization.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use foresight_core::errors::ForesightResult;
use foresight_core::models::RouteStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteStatsRecord {
    path: String,
    visits: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_visit: DateTime<Utc>,
    #[serde(default)]
    transitions: Vec<(String, u64)>,
}

impl From<&RouteStats> for RouteStatsRecord {
    fn from(stats: &RouteStats) -> Self {
        Self {
            path: stats.path.clone(),
            visits: stats.visits,
            last_visit: stats.last_visit,
            transitions: stats
                .transitions
                .iter()
                .map(|(dest, count)| (dest.clone(), *count))
                .collect(),
        }
    }
}

impl RouteStatsRecord {
    fn into_stats(self) -> Option<RouteStats> {
        if self.path.is_empty() {
            return None;
        }
        let mut transitions = BTreeMap::new();
        for (dest, count) in self.transitions {
            if dest.is_empty() || dest == self.path || count == 0 {
                continue;
            }
            *transitions.entry(dest).or_insert(0) += count;
        }
        Some(RouteStats {
            path: self.path,
            visits: self.visits,
            last_visit: self.last_visit,
            transitions,
        })
    }
}

/// Serialize the table, sorted by path.
pub fn encode<'a>(routes: impl IntoIterator<Item = &'a RouteStats>) -> ForesightResult<String> {
    let mut records: Vec<RouteStatsRecord> = routes.into_iter().map(RouteStatsRecord::from).collect();
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(serde_json::to_string(&records)?)
}

/// Deserialize the table, discarding anything malformed.
pub fn decode(raw: &str) -> Vec<RouteStats> {
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unreadable route stats");
            return Vec::new();
        }
    };

    let total = values.len();
    let decoded: Vec<RouteStats> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RouteStatsRecord>(value).ok())
        .filter_map(RouteStatsRecord::into_stats)
        .collect();

    if decoded.len() < total {
        tracing::warn!(
            discarded = total - decoded.len(),
            kept = decoded.len(),
            "discarded malformed route stats records"
        );
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encodes_transitions_as_pairs() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut stats = RouteStats::new("/a", now);
        stats.record_visit(now);
        stats.record_transition("/b");

        let raw = encode([&stats]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["path"], "/a");
        assert_eq!(json[0]["visits"], 1);
        assert_eq!(json[0]["lastVisit"], now.timestamp_millis());
        assert_eq!(json[0]["transitions"][0][0], "/b");
        assert_eq!(json[0]["transitions"][0][1], 1);
    }

    #[test]
    fn garbage_document_decodes_empty() {
        assert!(decode("not json at all").is_empty());
        assert!(decode(r#"{"path": "/a"}"#).is_empty());
    }

    #[test]
    fn malformed_records_are_skipped() {
        let raw = r#"[
            {"path": "/a", "visits": 2, "lastVisit": 1700000000000, "transitions": [["/b", 1]]},
            {"path": "/broken", "visits": "many"},
            {"visits": 1, "lastVisit": 1700000000000},
            {"path": "", "visits": 1, "lastVisit": 1700000000000}
        ]"#;
        let routes = decode(raw);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/a");
    }

    #[test]
    fn self_loops_and_zero_counts_are_dropped_on_load() {
        let raw = r#"[{"path": "/a", "visits": 1, "lastVisit": 1700000000000,
                       "transitions": [["/a", 4], ["/b", 0], ["/c", 2]]}]"#;
        let routes = decode(raw);
        assert_eq!(routes[0].transitions.len(), 1);
        assert_eq!(routes[0].transitions["/c"], 2);
    }
}
