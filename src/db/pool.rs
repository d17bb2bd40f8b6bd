//! SQLite connection pool with WAL mode.
//!
//! Provides a thread-safe connection pool for SQLite with Write-Ahead Logging (WAL)
//! enabled for concurrent read access during writes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<Sqlite>;

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a new connection pool with WAL mode enabled.
///
/// WAL mode lets stats and lookups read while an assignment transaction
/// is writing. Writers open with `BEGIN IMMEDIATE` (see `db::begin_write`)
/// and queue on the busy timeout.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `max_connections` - Upper bound on pooled connections
pub async fn create_pool(db_path: &Path, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let db_url = format!("sqlite:{}", db_path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        // Create the database file if it doesn't exist
        .create_if_missing(true)
        // Enable WAL mode so readers never block on the writer
        .journal_mode(SqliteJournalMode::Wal)
        // NORMAL synchronous mode balances safety and performance
        .synchronous(SqliteSynchronous::Normal)
        // Enforce team and author references
        .foreign_keys(true)
        // Queued writers (BEGIN IMMEDIATE) wait this long for the write lock
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        // At least one connection, even if configured as zero
        .max_connections(max_connections.max(1))
        // Keep one connection warm
        .min_connections(1)
        // Connection timeout
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;

    // Verify WAL mode is enabled
    let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await?;

    debug_assert!(
        mode.0.to_lowercase() == "wal",
        "WAL mode should be enabled, got: {}",
        mode.0
    );

    Ok(pool)
}

/// Create a single-connection in-memory pool.
///
/// The database lives as long as its one connection, so the pool never
/// recycles it.
pub async fn create_memory_pool() -> Result<DbPool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        // A second connection would open a separate, empty database
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_pool_with_wal() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool = create_pool(&db_path, DEFAULT_MAX_CONNECTIONS).await.unwrap();

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.0.to_lowercase(), "wal");

        let fk: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(fk.0, 1);
    }

    #[tokio::test]
    async fn test_pool_requires_parent_directory() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("subdir/test.db");

        // create_if_missing only creates the file, not directories
        let result = create_pool(&db_path, 1).await;
        assert!(result.is_err());

        std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();

        let pool = create_pool(&db_path, 1).await.unwrap();
        assert!(db_path.exists());

        let result: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_state() {
        let pool = create_memory_pool().await.unwrap();

        sqlx::query("CREATE TABLE t (x INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (x) VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
