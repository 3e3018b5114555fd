//! SQLite-backed session handler
//!
//! Sessions live in a single `sessions` table keyed by the hashed session id.

use crate::id::hash_session_id;
use async_trait::async_trait;
use sessionward_core::{SessionError, SessionHandler, SessionRecords, SessionResult};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

/// Session handler on top of the `sessions` table
#[derive(Debug, Clone)]
pub struct SqliteSessionHandler {
    pool: SqlitePool,
}

impl SqliteSessionHandler {
    /// Wrap an existing pool. The schema is not touched; see [`Self::ensure_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` and make sure the `sessions` table exists
    pub async fn connect(database_url: &str) -> SessionResult<Self> {
        info!("Connecting session database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| SessionError::storage("Invalid database URL", "connect", e))?
            .create_if_missing(true);

        // Every connection to an in-memory database is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| SessionError::storage("Failed to connect to database", "connect", e))?;

        let handler = Self::new(pool);
        handler.ensure_schema().await?;
        Ok(handler)
    }

    /// 创建会话表
    pub async fn ensure_schema(&self) -> SessionResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                sid TEXT PRIMARY KEY,
                uid INTEGER NOT NULL DEFAULT 0,
                session TEXT NOT NULL,
                timestamp INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::storage("Failed to create sessions table", "ensure_schema", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_uid ON sessions(uid)")
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::storage("Failed to create uid index", "ensure_schema", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_timestamp ON sessions(timestamp)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                SessionError::storage("Failed to create timestamp index", "ensure_schema", e)
            })?;

        debug!("Sessions table ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored sessions, optionally restricted to one owner
    pub async fn count(&self, uid: Option<i64>) -> SessionResult<i64> {
        let row = match uid {
            Some(uid) => {
                sqlx::query("SELECT COUNT(*) AS count FROM sessions WHERE uid = ?")
                    .bind(uid)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT COUNT(*) AS count FROM sessions")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| SessionError::storage("Failed to count sessions", "count", e))?;

        Ok(row.get("count"))
    }
}

#[async_trait]
impl SessionHandler for SqliteSessionHandler {
    async fn read(&self, sid: &str) -> SessionResult<Option<String>> {
        let row = sqlx::query("SELECT session FROM sessions WHERE sid = ?")
            .bind(hash_session_id(sid))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SessionError::storage("Failed to read session", "read", e))?;

        row.map(|row| row.try_get::<String, _>("session"))
            .transpose()
            .map_err(|e| SessionError::storage("Malformed session row", "read", e))
    }

    async fn write(&self, sid: &str, data: &str, uid: i64) -> SessionResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (sid, uid, session, timestamp)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(sid) DO UPDATE SET
                uid = excluded.uid,
                session = excluded.session,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(hash_session_id(sid))
        .bind(uid)
        .bind(data)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::storage("Failed to write session", "write", e))?;

        Ok(())
    }

    async fn destroy(&self, sid: &str) -> SessionResult<()> {
        sqlx::query("DELETE FROM sessions WHERE sid = ?")
            .bind(hash_session_id(sid))
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::storage("Failed to destroy session", "destroy", e))?;

        Ok(())
    }

    async fn gc(&self, max_lifetime: u64) -> SessionResult<u64> {
        let cutoff = chrono::Utc::now().timestamp() - max_lifetime as i64;
        let result = sqlx::query("DELETE FROM sessions WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::storage("Failed to collect sessions", "gc", e))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionRecords for SqliteSessionHandler {
    async fn delete_for_user(&self, uid: i64) -> SessionResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::storage("Failed to delete user sessions", "delete_for_user", e))?;

        Ok(result.rows_affected())
    }
}
