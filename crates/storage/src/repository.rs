//! Sum Store Implementation

use crate::StorageError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CREATE_SUMS_TABLE: &str = "CREATE TABLE IF NOT EXISTS sums (\
    id INTEGER PRIMARY KEY AUTOINCREMENT, \
    first_number INTEGER NOT NULL, \
    second_number INTEGER NOT NULL, \
    total INTEGER NOT NULL);";

const INSERT_SUM: &str = "INSERT INTO sums(first_number, second_number, total) VALUES (?, ?, ?);";

const COUNT_SUMS: &str = "SELECT COUNT(total) FROM sums;";

/// A persisted sum. `total` is always `first_number + second_number`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SumRecord {
    pub id: i64,
    pub first_number: i64,
    pub second_number: i64,
    pub total: i64,
}

/// Store for recorded sums.
///
/// Every operation opens its own connection and closes it before returning.
/// `record_sum` runs the insert and the count as two separate statements, so
/// concurrent callers may observe each other's rows in the returned count.
#[derive(Debug, Clone)]
pub struct SumStore {
    path: PathBuf,
    options: SqliteConnectOptions,
}

impl SumStore {
    /// Create a store backed by the database file at `path`.
    ///
    /// No connection is made until an operation runs. The file is created on
    /// first use if it does not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);

        Self { path, options }
    }

    /// Create the `sums` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(CREATE_SUMS_TABLE).execute(&mut conn).await;
        self.close(conn).await;
        result?;

        info!(path = %self.path.display(), "Sum table ready");
        Ok(())
    }

    /// Insert `(a, b, a + b)` and return how many sums are stored afterwards.
    pub async fn record_sum(&self, a: i64, b: i64) -> Result<i64, StorageError> {
        let total = a.checked_add(b).ok_or(StorageError::Overflow { a, b })?;

        let mut conn = self.connect().await?;
        let result = Self::insert_and_count(&mut conn, a, b, total).await;
        self.close(conn).await;

        let count = result?;
        debug!(a, b, total, count, "Recorded sum");
        Ok(count)
    }

    async fn insert_and_count(
        conn: &mut SqliteConnection,
        a: i64,
        b: i64,
        total: i64,
    ) -> Result<i64, StorageError> {
        sqlx::query(INSERT_SUM)
            .bind(a)
            .bind(b)
            .bind(total)
            .execute(&mut *conn)
            .await?;

        let (count,): (i64,) = sqlx::query_as(COUNT_SUMS).fetch_one(&mut *conn).await?;
        Ok(count)
    }

    /// Delete every stored sum, returning the number of rows removed.
    pub async fn reset_all(&self) -> Result<u64, StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("DELETE FROM sums;").execute(&mut conn).await;
        self.close(conn).await;

        Ok(result?.rows_affected())
    }

    /// Number of stored sums
    pub async fn count(&self) -> Result<i64, StorageError> {
        let mut conn = self.connect().await?;
        let result: Result<(i64,), _> = sqlx::query_as(COUNT_SUMS).fetch_one(&mut conn).await;
        self.close(conn).await;

        Ok(result?.0)
    }

    /// All stored sums in insertion order
    pub async fn list_sums(&self) -> Result<Vec<SumRecord>, StorageError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query_as::<_, SumRecord>(
            "SELECT id, first_number, second_number, total FROM sums ORDER BY id;",
        )
        .fetch_all(&mut conn)
        .await;
        self.close(conn).await;

        Ok(result?)
    }

    async fn connect(&self) -> Result<SqliteConnection, StorageError> {
        self.options
            .connect()
            .await
            .map_err(|source| StorageError::Connect {
                path: self.path.display().to_string(),
                source,
            })
    }

    async fn close(&self, conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!(path = %self.path.display(), error = %e, "Failed to close database connection");
        }
    }
}
