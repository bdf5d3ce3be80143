//! Storage layer for message activity
//!
//! Persists group message events and tracked groups in a local SQLite
//! database and answers per-user count queries.

mod models;

pub use models::{encode_timestamp, ActivityCount, MessageEvent, TrackedGroup};

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

static MIGRATOR: Migrator = sqlx::migrate!("./db_migrations");

const DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DB_MAX_CONNECTIONS: u32 = 10;
const DB_BUSY_TIMEOUT_MS: u64 = 5000;

/// Length of the trailing activity window.
pub const ACTIVITY_WINDOW_HOURS: i64 = 24;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Query or connection failure
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Schema migration failure
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// Could not prepare the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface for activity storage providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Append a message event stamped with the current time
    async fn record(
        &self,
        user_id: i64,
        username: &str,
        group_id: i64,
        group_title: &str,
    ) -> Result<(), StorageError>;
    /// Append a message event with its own timestamp
    async fn record_at(&self, event: &MessageEvent) -> Result<(), StorageError>;
    /// Register a group; keeps the existing title if already present
    async fn register_group(&self, group_id: i64, title: &str) -> Result<(), StorageError>;
    /// All tracked groups
    async fn list_groups(&self) -> Result<Vec<TrackedGroup>, StorageError>;
    /// Counts for `username` in `group_id`, windowed relative to now
    async fn count_for_user(
        &self,
        username: &str,
        group_id: i64,
    ) -> Result<ActivityCount, StorageError>;
    /// Counts for `username` in `group_id`, windowed relative to `now`
    async fn count_for_user_at(
        &self,
        username: &str,
        group_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ActivityCount, StorageError>;
}

/// SQLite-backed activity store
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl Database {
    /// Open (creating if needed) the database at `path` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the
    /// database cannot be opened, or a migration fails.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        debug!("Opening SQLite database at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(DB_BUSY_TIMEOUT_MS));

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECS))
            .max_connections(DB_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;
        info!("Database ready at {}", path.display());

        Ok(Self { pool, path })
    }

    /// Location of the database file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check that a connection can be acquired and queried
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn check_connection(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database connection check failed: {e}");
                StorageError::from(e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for Database {
    async fn record(
        &self,
        user_id: i64,
        username: &str,
        group_id: i64,
        group_title: &str,
    ) -> Result<(), StorageError> {
        self.record_at(&MessageEvent::now(user_id, username, group_id, group_title))
            .await
    }

    async fn record_at(&self, event: &MessageEvent) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO messages (user_id, username, group_id, group_title, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(event.user_id)
        .bind(&event.username)
        .bind(event.group_id)
        .bind(&event.group_title)
        .bind(encode_timestamp(event.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn register_group(&self, group_id: i64, title: &str) -> Result<(), StorageError> {
        let result = sqlx::query("INSERT OR IGNORE INTO groups (group_id, title) VALUES (?, ?)")
            .bind(group_id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() > 0 {
            info!("Now tracking group {group_id} ({title})");
        }
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<TrackedGroup>, StorageError> {
        let groups = sqlx::query_as::<_, TrackedGroup>(
            "SELECT group_id, COALESCE(title, '') AS title FROM groups
             ORDER BY title COLLATE NOCASE, group_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn count_for_user(
        &self,
        username: &str,
        group_id: i64,
    ) -> Result<ActivityCount, StorageError> {
        self.count_for_user_at(username, group_id, Utc::now()).await
    }

    async fn count_for_user_at(
        &self,
        username: &str,
        group_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ActivityCount, StorageError> {
        let since = now - ChronoDuration::hours(ACTIVITY_WINDOW_HOURS);
        // Both counts come from one statement so they share a snapshot.
        let (total, last_24h): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN timestamp >= ? THEN 1 ELSE 0 END), 0)
             FROM messages
             WHERE username = ? AND group_id = ?",
        )
        .bind(encode_timestamp(since))
        .bind(username)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(ActivityCount { total, last_24h })
    }
}
