//! Shared SQLite pool setup for the durable session and artifact stores.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

const SCHEMA_META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS adventure_schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Open (creating if needed) the adventure database at `path`.
pub async fn open_pool(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create database directory {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("open sqlite database {}", path.display()))
}

/// Single-connection in-memory pool.
#[cfg(test)]
pub(crate) async fn open_memory_pool() -> Result<SqlitePool> {
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .context("parse in-memory sqlite url")?;
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .context("open in-memory sqlite database")
}

/// Record `version` under `key`, refusing to run against a different one.
pub async fn ensure_schema_version(pool: &SqlitePool, key: &str, version: u32) -> Result<()> {
    sqlx::query(SCHEMA_META_TABLE)
        .execute(pool)
        .await
        .context("create adventure_schema_meta table")?;

    let stored: Option<(String,)> =
        sqlx::query_as("SELECT value FROM adventure_schema_meta WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("load schema version {key}"))?;

    if let Some((value,)) = stored {
        let parsed = value
            .parse::<u32>()
            .with_context(|| format!("invalid schema version value for {key}: {value}"))?;
        anyhow::ensure!(
            parsed == version,
            "incompatible {key}: stored={parsed}, expected={version}. remove the database and restart."
        );
        return Ok(());
    }

    sqlx::query("INSERT INTO adventure_schema_meta (key, value) VALUES ($1, $2)")
        .bind(key)
        .bind(version.to_string())
        .execute(pool)
        .await
        .with_context(|| format!("persist schema version {key}"))?;

    Ok(())
}
