use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a cache entry.
pub type EntryMetadata = BTreeMap<String, serde_json::Value>;

/// A cached value with its freshness envelope.
///
/// Invariant: `expires_at >= created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub version: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntryMetadata>,
}

impl<T> CacheEntry<T> {
    /// Wrap `data` stamped at `now`. A negative `ttl` is treated as zero and
    /// an expiry past the representable range saturates.
    pub fn new(
        data: T,
        version: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
        metadata: Option<EntryMetadata>,
    ) -> Self {
        let ttl = if ttl < Duration::zero() { Duration::zero() } else { ttl };
        Self {
            data,
            created_at: now,
            version: version.into(),
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            metadata,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn matches_version(&self, version: &str) -> bool {
        self.version == version
    }

    /// Transform the payload, keeping the envelope.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            data: f(self.data),
            created_at: self.created_at,
            version: self.version,
            expires_at: self.expires_at,
            metadata: self.metadata,
        }
    }
}
