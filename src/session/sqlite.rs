use super::store::{SessionStore, new_session_id};
use crate::game::GameSession;
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use std::future::Future;
use std::pin::Pin;

const SESSION_SCHEMA_VERSION_KEY: &str = "session_schema_version";
const SESSION_SCHEMA_VERSION: u32 = 1;

/// Durable session store: one JSON document per session.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Create a new store with an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        crate::db::ensure_schema_version(&pool, SESSION_SCHEMA_VERSION_KEY, SESSION_SCHEMA_VERSION)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS game_sessions (
                 id         TEXT PRIMARY KEY,
                 document   TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await
        .context("create game_sessions table")?;

        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert(&self, session: &GameSession) -> Result<()> {
        let document = serde_json::to_string(session).context("serialize session document")?;
        sqlx::query(
            "INSERT INTO game_sessions (id, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT(id) DO UPDATE SET
                 document = excluded.document,
                 updated_at = excluded.updated_at",
        )
        .bind(&session.id)
        .bind(document)
        .bind(&session.created_at)
        .bind(&session.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("save session {}", session.id))?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn create<'a>(
        &'a self,
        system_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GameSession>> + Send + 'a>> {
        Box::pin(async move {
            let session = GameSession::new(new_session_id(), system_prompt);
            self.upsert(&session).await?;
            Ok(session)
        })
    }

    fn load<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GameSession>>> + Send + 'a>> {
        Box::pin(async move {
            let row: Option<(String,)> =
                sqlx::query_as("SELECT document FROM game_sessions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .with_context(|| format!("load session {id}"))?;

            row.map(|(document,)| {
                serde_json::from_str::<GameSession>(&document)
                    .with_context(|| format!("deserialize session {id}"))
            })
            .transpose()
        })
    }

    fn save<'a>(
        &'a self,
        session: &'a GameSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.upsert(session))
    }

    fn delete<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM game_sessions WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("delete session {id}"))?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn count(&self) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + '_>> {
        Box::pin(async move {
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM game_sessions")
                .fetch_one(&self.pool)
                .await
                .context("count sessions")?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
    }
}
