//! SQLite-backed [`KeyValueStore`] implementation.
//!
//! Every key lives in one row of the `kv` table. `insert_new` and `update`
//! run inside `BEGIN IMMEDIATE` transactions: SQLite grants the write lock
//! before the first read, so two processes sharing the database file
//! cannot interleave their read-modify-write cycles. The loser waits for
//! the connection's busy timeout.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};

use docstash_core::kv::{KeyValueStore, UpdateFn};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const UPSERT: &str = r#"
    INSERT INTO kv (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_new(&self, entries: &[(String, String)]) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let outcome = insert_locked(&mut conn, entries).await;
        finish(&mut conn, outcome).await
    }

    async fn update(&self, key: &str, apply: &mut UpdateFn<'_>) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let outcome = update_locked(&mut conn, key, apply).await;
        finish(&mut conn, outcome).await
    }
}

async fn insert_locked(conn: &mut SqliteConnection, entries: &[(String, String)]) -> Result<bool> {
    for (key, _) in entries {
        let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;
        if taken.is_some() {
            tracing::debug!(key = %key, "key already taken; nothing inserted");
            return Ok(false);
        }
    }

    let now = chrono::Utc::now().timestamp();
    for (key, value) in entries {
        sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }
    Ok(true)
}

async fn update_locked(conn: &mut SqliteConnection, key: &str, apply: &mut UpdateFn<'_>) -> Result<()> {
    let current: Option<String> = sqlx::query_scalar("SELECT value FROM kv WHERE key = ?")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(next) = apply(current)? else {
        return Ok(());
    };

    sqlx::query(UPSERT)
        .bind(key)
        .bind(next)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Commit on success, roll back otherwise. The connection goes back to
/// the pool with no transaction open either way.
async fn finish<T>(conn: &mut SqliteConnection, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => match sqlx::query("COMMIT").execute(&mut *conn).await {
            Ok(_) => Ok(value),
            Err(e) => {
                rollback(conn).await;
                Err(e.into())
            }
        },
        Err(e) => {
            rollback(conn).await;
            Err(e)
        }
    }
}

async fn rollback(conn: &mut SqliteConnection) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        tracing::warn!(error = %e, "rollback failed");
    }
}
