//! Opening the docstash database.
//!
//! Every CLI invocation opens its own pool against the same file, so the
//! connection options are tuned for several short-lived processes writing
//! at once:
//!
//! | Option | Value | Effect |
//! |--------|-------|--------|
//! | journal mode | WAL | readers never wait for the writer |
//! | synchronous | NORMAL | durable at checkpoints, cheap per commit |
//! | busy timeout | 10 s | a second writer queues instead of failing with `SQLITE_BUSY` |

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CONNECTIONS: u32 = 4;

/// Open (creating if needed) the database file at `path`.
pub async fn connect(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))?;

    tracing::debug!(path = %path.display(), "opened database");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/docstash.sqlite");

        let pool = connect(&path).await.unwrap();
        assert!(path.exists());

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let busy_ms: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(busy_ms, BUSY_TIMEOUT.as_millis() as i64);
        pool.close().await;
    }

    #[tokio::test]
    async fn test_reopens_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstash.sqlite");

        connect(&path).await.unwrap().close().await;
        let pool = connect(&path).await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }
}
