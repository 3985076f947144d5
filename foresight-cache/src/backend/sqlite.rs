//! Durable backend on a single SQLite connection.
//!
//! Calls block on disk I/O, so `TieredCache` runs them on the blocking pool.
//! WAL mode, NORMAL sync, 5s busy_timeout.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use foresight_core::errors::{ForesightError, ForesightResult, StorageError};
use foresight_core::models::{CacheEntry, EntryMetadata};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{EntryInfo, ICacheBackend};
use crate::StoredEntry;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache_entries (
        key         TEXT PRIMARY KEY,
        data        TEXT NOT NULL,
        version     TEXT NOT NULL,
        created_at  INTEGER NOT NULL,
        expires_at  INTEGER NOT NULL,
        metadata    TEXT,
        access_tick INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS idx_cache_entries_access ON cache_entries(access_tick);
    CREATE INDEX IF NOT EXISTS idx_cache_entries_created ON cache_entries(created_at);
";

fn to_storage_err(e: impl std::fmt::Display) -> ForesightError {
    StorageError::Backend {
        backend: "sqlite".to_string(),
        message: e.to_string(),
    }
    .into()
}

fn from_millis(key: &str, ms: i64) -> ForesightResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        StorageError::Corrupt {
            key: key.to_string(),
            reason: format!("timestamp {ms} out of range"),
        }
        .into()
    })
}

struct RawRow {
    key: String,
    data: String,
    version: String,
    created_at: i64,
    expires_at: i64,
    metadata: Option<String>,
    access_tick: i64,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get(0)?,
            data: row.get(1)?,
            version: row.get(2)?,
            created_at: row.get(3)?,
            expires_at: row.get(4)?,
            metadata: row.get(5)?,
            access_tick: row.get(6)?,
        })
    }

    fn into_entry(self) -> ForesightResult<StoredEntry> {
        let corrupt = |reason: String| StorageError::Corrupt {
            key: self.key.clone(),
            reason,
        };
        let data = serde_json::from_str(&self.data).map_err(|e| corrupt(e.to_string()))?;
        let metadata = match &self.metadata {
            Some(raw) => Some(
                serde_json::from_str::<EntryMetadata>(raw).map_err(|e| corrupt(e.to_string()))?,
            ),
            None => None,
        };
        Ok(CacheEntry {
            data,
            created_at: from_millis(&self.key, self.created_at)?,
            version: self.version,
            expires_at: from_millis(&self.key, self.expires_at)?,
            metadata,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT key, data, version, created_at, expires_at, metadata, access_tick FROM cache_entries";

/// SQLite-backed cache storage.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    tick: AtomicU64,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> ForesightResult<Self> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> ForesightResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> ForesightResult<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(to_storage_err)?;
        conn.execute_batch(SCHEMA).map_err(to_storage_err)?;
        let max_tick: i64 = conn
            .query_row("SELECT COALESCE(MAX(access_tick), 0) FROM cache_entries", [], |row| {
                row.get(0)
            })
            .map_err(to_storage_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
            tick: AtomicU64::new(max_tick.max(0) as u64),
        })
    }

    /// Run `f` with exclusive access to the connection.
    fn with_conn<F, T>(&self, f: F) -> ForesightResult<T>
    where
        F: FnOnce(&Connection) -> ForesightResult<T>,
    {
        let guard = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn next_tick(&self) -> i64 {
        (self.tick.fetch_add(1, Ordering::Relaxed) + 1) as i64
    }

    fn select_one(conn: &Connection, key: &str) -> ForesightResult<Option<RawRow>> {
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE key = ?1"),
            params![key],
            RawRow::read,
        )
        .optional()
        .map_err(to_storage_err)
    }

    /// Decode `row`, deleting it when its contents are unreadable.
    fn decode_or_drop(conn: &Connection, row: RawRow) -> ForesightResult<Option<StoredEntry>> {
        let key = row.key.clone();
        match row.into_entry() {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "removing unreadable cache entry");
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                    .map_err(to_storage_err)?;
                Ok(None)
            }
        }
    }

    fn first_key(&self, sql: &str) -> ForesightResult<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(sql, [], |row| row.get(0))
                .optional()
                .map_err(to_storage_err)
        })
    }
}

impl ICacheBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn get(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        let tick = self.next_tick();
        self.with_conn(|conn| {
            let Some(row) = Self::select_one(conn, key)? else {
                return Ok(None);
            };
            let Some(entry) = Self::decode_or_drop(conn, row)? else {
                return Ok(None);
            };
            conn.execute(
                "UPDATE cache_entries SET access_tick = ?1 WHERE key = ?2",
                params![tick, key],
            )
            .map_err(to_storage_err)?;
            Ok(Some(entry))
        })
    }

    fn peek(&self, key: &str) -> ForesightResult<Option<StoredEntry>> {
        self.with_conn(|conn| match Self::select_one(conn, key)? {
            Some(row) => Self::decode_or_drop(conn, row),
            None => Ok(None),
        })
    }

    fn set(&self, key: &str, entry: StoredEntry) -> ForesightResult<()> {
        let data = serde_json::to_string(&entry.data)?;
        let metadata = entry.metadata.as_ref().map(serde_json::to_string).transpose()?;
        let tick = self.next_tick();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cache_entries (key, data, version, created_at, expires_at, metadata, access_tick)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(key) DO UPDATE SET
                    data = excluded.data,
                    version = excluded.version,
                    created_at = excluded.created_at,
                    expires_at = excluded.expires_at,
                    metadata = excluded.metadata,
                    access_tick = excluded.access_tick",
                params![
                    key,
                    data,
                    entry.version,
                    entry.created_at.timestamp_millis(),
                    entry.expires_at.timestamp_millis(),
                    metadata,
                    tick,
                ],
            )
            .map_err(to_storage_err)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> ForesightResult<bool> {
        self.with_conn(|conn| {
            let removed = conn
                .execute("DELETE FROM cache_entries WHERE key = ?1", params![key])
                .map_err(to_storage_err)?;
            Ok(removed > 0)
        })
    }

    fn clear(&self) -> ForesightResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM cache_entries", [])
                .map_err(to_storage_err)?;
            Ok(())
        })
    }

    fn size(&self) -> ForesightResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
                .map_err(to_storage_err)?;
            Ok(count.max(0) as usize)
        })
    }

    fn contains(&self, key: &str) -> ForesightResult<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM cache_entries WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .map_err(to_storage_err)?;
            Ok(found.is_some())
        })
    }

    fn keys(&self) -> ForesightResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT key FROM cache_entries ORDER BY key")
                .map_err(to_storage_err)?;
            let keys = stmt
                .query_map([], |row| row.get(0))
                .map_err(to_storage_err)?
                .collect::<rusqlite::Result<Vec<String>>>()
                .map_err(to_storage_err)?;
            Ok(keys)
        })
    }

    fn scan(&self) -> ForesightResult<Vec<EntryInfo>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_COLUMNS).map_err(to_storage_err)?;
            let rows = stmt
                .query_map([], RawRow::read)
                .map_err(to_storage_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(to_storage_err)?;
            drop(stmt);

            let mut infos = Vec::with_capacity(rows.len());
            for row in rows {
                let key = row.key.clone();
                let tick = row.access_tick.max(0) as u64;
                if let Some(entry) = Self::decode_or_drop(conn, row)? {
                    infos.push(EntryInfo::from_entry(&key, &entry, tick));
                }
            }
            Ok(infos)
        })
    }

    fn least_recently_used(&self) -> ForesightResult<Option<String>> {
        self.first_key("SELECT key FROM cache_entries ORDER BY access_tick ASC, key ASC LIMIT 1")
    }

    fn oldest(&self) -> ForesightResult<Option<String>> {
        self.first_key("SELECT key FROM cache_entries ORDER BY created_at ASC, key ASC LIMIT 1")
    }

    fn earliest_expiry(&self) -> ForesightResult<Option<String>> {
        self.first_key("SELECT key FROM cache_entries ORDER BY expires_at ASC, key ASC LIMIT 1")
    }

    fn is_blocking(&self) -> bool {
        true
    }
}
