// src/ledger.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("failed to open ledger at {path}: {source}")]
    Open {
        path: String,
        source: sqlx::Error,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Terminal status of one attempt. Set once at insert, never mutated.
/// Stored as lowercase text in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttemptStatus {
    Visited,
    Applied,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Visited => "visited",
            AttemptStatus::Applied => "applied",
            AttemptStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per distinct URL ever attempted. Append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttemptRecord {
    pub id: i64,
    pub session_id: String,
    pub platform: String,
    pub platform_name: String,
    pub job_title: String,
    pub company: Option<String>,
    pub location: String,
    pub url: String,
    pub page_title: Option<String>,
    pub status: AttemptStatus,
    pub error_message: Option<String>,
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

/// New attempt waiting to be appended. `id` and `created_at` are
/// assigned by the store on insert.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub session_id: String,
    pub platform: String,
    pub platform_name: String,
    pub job_title: String,
    pub company: Option<String>,
    pub location: String,
    pub url: String,
    pub page_title: Option<String>,
    pub status: AttemptStatus,
    pub error_message: Option<String>,
    pub timestamp: String,
}

/// Persistent, deduplicating store of application attempts, keyed by URL.
///
/// The ledger is the sole owner of the underlying SQLite store. It never
/// retries internally; storage faults surface as `LedgerError` and retry
/// policy lives with the caller.
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (creating if needed) the ledger database at the given path.
    pub async fn open(database_path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    LedgerError::Open {
                        path: database_path.display().to_string(),
                        source: sqlx::Error::Io(e),
                    }
                })?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url)
            .await
            .map_err(|e| LedgerError::Open {
                path: database_path.display().to_string(),
                source: e,
            })?;

        info!("Ledger opened: {}", database_path.display());

        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    /// Open an in-memory ledger. Used by tests. Capped at one connection
    /// so every query sees the same in-memory database.
    pub async fn open_in_memory() -> LedgerResult<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let ledger = Self { pool };
        ledger.migrate().await?;
        Ok(ledger)
    }

    async fn migrate(&self) -> LedgerResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT,
                platform TEXT,
                platform_name TEXT,
                job_title TEXT,
                company TEXT,
                location TEXT,
                url TEXT UNIQUE,
                page_title TEXT,
                status TEXT,
                error_message TEXT,
                timestamp TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_applications_url ON applications(url);")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_applications_timestamp ON applications(timestamp);",
        )
        .execute(&self.pool)
        .await?;

        info!("Ledger migrations completed");
        Ok(())
    }

    /// True iff a record with this exact URL is already stored.
    ///
    /// This is the sole deduplication gate: checked before any external
    /// action runs, across the full persisted history, not just the
    /// current session.
    pub async fn exists(&self, url: &str) -> LedgerResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE url = ?")
                .bind(url)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Idempotent append. A duplicate URL is a silent no-op: the first
    /// record wins and is never overwritten. Returns whether a row was
    /// actually written.
    pub async fn insert(&self, attempt: &NewAttempt) -> LedgerResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO applications
            (session_id, platform, platform_name, job_title, company, location,
             url, page_title, status, error_message, timestamp, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attempt.session_id)
        .bind(&attempt.platform)
        .bind(&attempt.platform_name)
        .bind(&attempt.job_title)
        .bind(&attempt.company)
        .bind(&attempt.location)
        .bind(&attempt.url)
        .bind(&attempt.page_title)
        .bind(attempt.status)
        .bind(&attempt.error_message)
        .bind(&attempt.timestamp)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of records ever stored.
    pub async fn total(&self) -> LedgerResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Per-platform record counts, descending by count. Ties keep the
    /// insertion order of the platform's first appearance.
    pub async fn count_by_platform(&self) -> LedgerResult<Vec<(String, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT platform_name, COUNT(*)
            FROM applications
            GROUP BY platform_name
            ORDER BY COUNT(*) DESC, MIN(id) ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record counts keyed by status.
    pub async fn count_by_status(&self) -> LedgerResult<BTreeMap<String, i64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    /// The `n` most recent records, newest first.
    pub async fn recent(&self, n: i64) -> LedgerResult<Vec<AttemptRecord>> {
        let records = sqlx::query_as::<_, AttemptRecord>(
            r#"
            SELECT id, session_id, platform, platform_name, job_title, company,
                   location, url, page_title, status, error_message, timestamp,
                   created_at
            FROM applications
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Number of distinct run sessions that have recorded at least one
    /// attempt.
    pub async fn session_count(&self) -> LedgerResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM applications")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
