//! Database layer for SQLite storage.
//!
//! This module handles:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - The roster and pull request stores
//!
//! Store functions take `&mut SqliteConnection` so they run unchanged on a
//! pooled connection or inside a caller's transaction.

pub mod pool;
pub mod pull_requests;
pub mod roster;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Schema migrations in application order.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Default database file name, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "pr-reviewer.db";

/// Get the current Unix timestamp.
pub(crate) fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Begin a write transaction that takes the database write lock up front.
///
/// A deferred transaction in WAL mode fails with `SQLITE_BUSY_SNAPSHOT` when
/// another connection commits between its first read and its first write.
/// `BEGIN IMMEDIATE` instead waits on the busy timeout, so concurrent writers
/// run one after another and each reads the previous one's committed state.
pub async fn begin_write(
    pool: &pool::DbPool,
) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
/// * `max_connections` - Pool size
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize(db_path: &Path, max_connections: u32) -> Result<pool::DbPool, DbError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::Migration(format!("Failed to create database directory: {}", e))
            })?;
        }
    }

    let pool = pool::create_pool(db_path, max_connections).await?;
    run_migrations(&pool).await?;

    log::info!("[db] Database ready at {}", db_path.display());
    Ok(pool)
}

/// Initialize a fresh in-memory database with the full schema.
pub async fn initialize_in_memory() -> Result<pool::DbPool, DbError> {
    let pool = pool::create_memory_pool().await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run all pending database migrations.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    for &(name, migration_sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        if applied.is_some() {
            continue;
        }

        // A migration and its bookkeeping row land together or not at all.
        let mut tx = sqlx::Connection::begin(&mut *conn).await?;
        for statement in parse_sql_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        }
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("[db] Applied migration {}", name);
    }

    Ok(())
}

/// Parse SQL statements from a migration file.
///
/// This handles:
/// - Comments (lines starting with --)
/// - Semicolons inside parentheses (e.g., `strftime('%s', 'now')`)
/// - Multi-line statements
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current_statement = String::new();
    let mut paren_depth: i32 = 0;

    for line in sql.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("--") {
            continue;
        }

        let line_without_comment = match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        };

        for ch in line_without_comment.chars() {
            match ch {
                '(' => {
                    paren_depth += 1;
                    current_statement.push(ch);
                }
                ')' => {
                    paren_depth = (paren_depth - 1).max(0);
                    current_statement.push(ch);
                }
                ';' if paren_depth == 0 => {
                    let stmt = current_statement.trim().to_string();
                    if !stmt.is_empty() {
                        statements.push(stmt);
                    }
                    current_statement.clear();
                }
                _ => current_statement.push(ch),
            }
        }

        if !current_statement.is_empty() {
            current_statement.push(' ');
        }
    }

    let final_stmt = current_statement.trim().to_string();
    if !final_stmt.is_empty() {
        statements.push(final_stmt);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_initialize_creates_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/test.db");

        let pool = initialize(&db_path, 2).await.unwrap();

        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_migrations' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(table_names, vec!["pull_requests", "teams", "users"]);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let pool1 = initialize(&db_path, 1).await.unwrap();
        pool1.close().await;
        let pool2 = initialize(&db_path, 1).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(&pool2)
            .await
            .unwrap();
        assert_eq!(count.0, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_status_check_constraint() {
        let pool = initialize_in_memory().await.unwrap();

        sqlx::query("INSERT INTO teams (team_name) VALUES ('core')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO users (user_id, username, team_name) VALUES ('u1', 'Alice', 'core')")
            .execute(&pool)
            .await
            .unwrap();

        let result = sqlx::query(
            "INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at) VALUES ('pr-1', 'x', 'u1', 'CLOSED', 0)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_write_transactions_wait_for_each_other() {
        let dir = tempdir().unwrap();
        let pool = initialize(&dir.path().join("test.db"), 2).await.unwrap();

        let mut first = begin_write(&pool).await.unwrap();

        let second_pool = pool.clone();
        let second = tokio::spawn(async move {
            let mut tx = begin_write(&second_pool).await.unwrap();
            let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM teams")
                .fetch_one(&mut *tx)
                .await
                .unwrap();
            tx.commit().await.unwrap();
            count.0
        });

        // Give the second writer time to queue behind the first.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        sqlx::query("INSERT INTO teams (team_name, created_at) VALUES ('core', 0)")
            .execute(&mut *first)
            .await
            .unwrap();
        first.commit().await.unwrap();

        assert_eq!(second.await.unwrap(), 1);
    }

    #[test]
    fn test_parse_sql_statements_keeps_parenthesized_semicolons() {
        let sql = "-- header\nCREATE TABLE a (x TEXT DEFAULT (';'));\nCREATE INDEX i ON a (x); -- trailing\n";
        let statements = parse_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a"));
        assert!(statements[1].starts_with("CREATE INDEX i"));
    }
}
