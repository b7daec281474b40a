//! SQLite-backed durable cache tier.
//!
//! One table per dataset holds the ordered payload as JSON rows; a shared
//! `cache_meta` table holds each dataset's freshness metadata. Writes replace
//! a dataset wholesale inside a transaction, and expired datasets are purged
//! on read so a restart never resurrects stale data.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, query, query_scalar};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::domain::types::DatasetKind;

const SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("cache payload corrupt for {dataset}: {message}")]
    Corrupt { dataset: DatasetKind, message: String },
    #[error("unsupported cache schema version {found}, expected {expected}")]
    SchemaVersion { found: i64, expected: i64 },
}

impl StorageError {
    fn corrupt(dataset: DatasetKind, err: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            dataset,
            message: err.to_string(),
        }
    }
}

/// A dataset read back from disk, freshness already checked.
#[derive(Debug, Clone)]
pub struct StoredDataset<T> {
    pub items: Vec<T>,
    pub fetched_at: OffsetDateTime,
    pub ttl: Duration,
}

/// Per-dataset bookkeeping for the `stats` command.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub dataset: DatasetKind,
    pub count: i64,
    pub fetched_at: OffsetDateTime,
    pub ttl: Duration,
    pub expired: bool,
}

pub struct SqliteCacheStore {
    pool: SqlitePool,
}

impl SqliteCacheStore {
    /// Open (creating if needed) the cache database at `path` and bring the
    /// schema up to date.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!(path = %path.display(), "Durable cache opened");
        Ok(store)
    }

    /// In-memory database for tests.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().in_memory(true))
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let version: i64 = query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        if version > SCHEMA_VERSION {
            return Err(StorageError::SchemaVersion {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        query(
            "CREATE TABLE IF NOT EXISTS cache_meta (
                dataset       TEXT PRIMARY KEY,
                fetched_at_ms INTEGER NOT NULL,
                ttl_ms        INTEGER NOT NULL,
                count         INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        for kind in DatasetKind::ALL {
            query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    position INTEGER PRIMARY KEY,
                    payload  TEXT NOT NULL
                )",
                kind.as_str()
            ))
            .execute(&self.pool)
            .await?;
        }

        query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace `kind`'s payload and metadata wholesale.
    pub async fn put<T: Serialize + Sync>(
        &self,
        kind: DatasetKind,
        items: &[T],
        fetched_at: OffsetDateTime,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        query(&format!("DELETE FROM {}", kind.as_str()))
            .execute(&mut *tx)
            .await?;
        for (position, item) in items.iter().enumerate() {
            let payload =
                serde_json::to_string(item).map_err(|err| StorageError::corrupt(kind, err))?;
            query(&format!(
                "INSERT INTO {} (position, payload) VALUES (?1, ?2)",
                kind.as_str()
            ))
            .bind(position as i64)
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }

        let fetched_at_ms = (fetched_at.unix_timestamp_nanos() / 1_000_000) as i64;
        query(
            "INSERT INTO cache_meta (dataset, fetched_at_ms, ttl_ms, count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(dataset) DO UPDATE SET
                 fetched_at_ms = excluded.fetched_at_ms,
                 ttl_ms = excluded.ttl_ms,
                 count = excluded.count",
        )
        .bind(kind.as_str())
        .bind(fetched_at_ms)
        .bind(ttl.as_millis() as i64)
        .bind(items.len() as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(dataset = %kind, count = items.len(), "Durable cache written");
        Ok(())
    }

    /// Read `kind` back, purging it first if the TTL has elapsed. Returns
    /// `None` for an absent or expired dataset.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: DatasetKind,
    ) -> Result<Option<StoredDataset<T>>, StorageError> {
        let meta = query("SELECT fetched_at_ms, ttl_ms FROM cache_meta WHERE dataset = ?1")
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;
        let Some(meta) = meta else {
            return Ok(None);
        };

        let fetched_at_ms: i64 = meta.get("fetched_at_ms");
        let ttl_ms: i64 = meta.get("ttl_ms");
        let fetched_at = OffsetDateTime::from_unix_timestamp_nanos(fetched_at_ms as i128 * 1_000_000)
            .map_err(|err| StorageError::corrupt(kind, err))?;
        let ttl = Duration::from_millis(ttl_ms.max(0) as u64);

        let now = OffsetDateTime::now_utc();
        if (now - fetched_at).whole_milliseconds() >= ttl_ms as i128 {
            debug!(dataset = %kind, "Durable cache expired; purging");
            self.clear(kind).await?;
            return Ok(None);
        }

        let rows = query(&format!(
            "SELECT payload FROM {} ORDER BY position",
            kind.as_str()
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: String = row.get("payload");
            items.push(
                serde_json::from_str(&payload)
                    .map_err(|err| StorageError::corrupt(kind, err))?,
            );
        }

        Ok(Some(StoredDataset {
            items,
            fetched_at,
            ttl,
        }))
    }

    /// Drop one dataset's rows and metadata.
    pub async fn clear(&self, kind: DatasetKind) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        query(&format!("DELETE FROM {}", kind.as_str()))
            .execute(&mut *tx)
            .await?;
        query("DELETE FROM cache_meta WHERE dataset = ?1")
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), StorageError> {
        for kind in DatasetKind::ALL {
            self.clear(kind).await?;
        }
        info!("Durable cache cleared");
        Ok(())
    }

    pub async fn stats(&self) -> Result<Vec<DatasetStats>, StorageError> {
        let rows = query("SELECT dataset, fetched_at_ms, ttl_ms, count FROM cache_meta")
            .fetch_all(&self.pool)
            .await?;

        let now = OffsetDateTime::now_utc();
        let mut stats = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.get("dataset");
            let Some(dataset) = DatasetKind::ALL.into_iter().find(|k| k.as_str() == name) else {
                continue;
            };
            let fetched_at_ms: i64 = row.get("fetched_at_ms");
            let ttl_ms: i64 = row.get("ttl_ms");
            let fetched_at =
                OffsetDateTime::from_unix_timestamp_nanos(fetched_at_ms as i128 * 1_000_000)
                    .map_err(|err| StorageError::corrupt(dataset, err))?;
            stats.push(DatasetStats {
                dataset,
                count: row.get("count"),
                fetched_at,
                ttl: Duration::from_millis(ttl_ms.max(0) as u64),
                expired: (now - fetched_at).whole_milliseconds() >= ttl_ms as i128,
            });
        }
        Ok(stats)
    }
}
