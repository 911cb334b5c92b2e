use super::fingerprint::Fingerprint;
use super::store::{ArtifactStore, CacheStats};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::future::Future;
use std::pin::Pin;

const ARTIFACT_SCHEMA_VERSION_KEY: &str = "artifact_schema_version";
const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// SQLite-backed continuation cache. Several namespaces (narrative replies,
/// images) share one table.
pub struct SqliteArtifactStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteArtifactStore {
    /// Create a store over an existing pool and run migrations.
    pub async fn new(pool: SqlitePool, namespace: &str) -> Result<Self> {
        crate::db::ensure_schema_version(
            &pool,
            ARTIFACT_SCHEMA_VERSION_KEY,
            ARTIFACT_SCHEMA_VERSION,
        )
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS artifacts (
                 namespace   TEXT NOT NULL,
                 fingerprint TEXT NOT NULL,
                 body        BLOB NOT NULL,
                 created_at  TEXT NOT NULL,
                 PRIMARY KEY (namespace, fingerprint)
             )",
        )
        .execute(&pool)
        .await
        .context("create artifacts table")?;

        Ok(Self {
            pool,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl ArtifactStore for SqliteArtifactStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>> {
        Box::pin(async move {
            let row: Option<(Vec<u8>,)> = sqlx::query_as(
                "SELECT body FROM artifacts WHERE namespace = $1 AND fingerprint = $2",
            )
            .bind(&self.namespace)
            .bind(fingerprint.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("load artifact {fingerprint}"))?;
            Ok(row.map(|(body,)| body))
        })
    }

    fn put_if_absent<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
        artifact: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT OR IGNORE INTO artifacts (namespace, fingerprint, body, created_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(&self.namespace)
            .bind(fingerprint.as_str())
            .bind(&artifact)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .with_context(|| format!("store artifact {fingerprint}"))?;

            self.get(fingerprint)
                .await?
                .with_context(|| format!("artifact {fingerprint} vanished after insert"))
        })
    }

    fn stats(&self) -> Pin<Box<dyn Future<Output = Result<CacheStats>> + Send + '_>> {
        Box::pin(async move {
            let (entries, bytes): (i64, i64) = sqlx::query_as(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(body)), 0)
                 FROM artifacts WHERE namespace = $1",
            )
            .bind(&self.namespace)
            .fetch_one(&self.pool)
            .await
            .context("count artifacts")?;

            Ok(CacheStats {
                entries: u64::try_from(entries).unwrap_or_default(),
                bytes: u64::try_from(bytes).unwrap_or_default(),
            })
        })
    }
}
