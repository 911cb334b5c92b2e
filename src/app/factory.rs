use crate::cache::{
    ArtifactStore, DirectoryArtifactStore, MemoryArtifactStore, ResponseCache, SqliteArtifactStore,
};
use crate::config::{CacheBackend, Config, SessionBackend};
use crate::game::{AdventureEngine, ImageMaterializer, Narrator};
use crate::llm::{
    AnthropicNarrativeClient, ImageClient, NarrativeClient, OpenAiImageClient, RetryPolicy,
};
use crate::session::{MemorySessionStore, SessionStore, SqliteSessionStore};
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Everything the gateway, the terminal client and `stats` share.
#[derive(Clone)]
pub struct Services {
    pub engine: Arc<AdventureEngine>,
    pub images: Arc<ImageMaterializer>,
}

/// Wire up stores and provider clients from config.
pub async fn build_services(config: &Config) -> Result<Services> {
    let narrative: Arc<dyn NarrativeClient> =
        Arc::new(AnthropicNarrativeClient::new(&config.narrative));
    let image: Arc<dyn ImageClient> = Arc::new(OpenAiImageClient::new(&config.image));
    build_services_with_clients(config, narrative, image).await
}

/// Same as [`build_services`] with caller-supplied clients.
pub async fn build_services_with_clients(
    config: &Config,
    narrative: Arc<dyn NarrativeClient>,
    image: Arc<dyn ImageClient>,
) -> Result<Services> {
    let pool = if config.storage.uses_sqlite() {
        Some(crate::db::open_pool(&config.database_path()).await?)
    } else {
        None
    };

    let sessions: Arc<dyn SessionStore> = match config.storage.session_backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Sqlite => {
            Arc::new(SqliteSessionStore::new(require_pool(pool.as_ref())?).await?)
        }
    };
    let narrative_store = create_artifact_store(
        config.storage.narrative_cache,
        pool.as_ref(),
        "narrative",
        &config.continuation_dir(),
        "json",
    )
    .await?;
    let image_store = create_artifact_store(
        config.storage.image_cache,
        pool.as_ref(),
        "image",
        &config.image_dir(),
        "png",
    )
    .await?;

    let system_prompt = config.load_system_prompt()?;

    tracing::info!(
        sessions = sessions.name(),
        narrative_cache = narrative_store.name(),
        image_cache = image_store.name(),
        narrative_provider = narrative.name(),
        image_provider = image.name(),
        "adventure services ready"
    );

    let narrator = Narrator::new(
        ResponseCache::new(narrative_store),
        narrative,
        RetryPolicy::new(config.narrative.timeout_secs, config.narrative.max_retries),
    );
    let engine = Arc::new(AdventureEngine::new(
        Arc::clone(&sessions),
        narrator,
        system_prompt,
    ));
    let images = Arc::new(ImageMaterializer::new(
        ResponseCache::new(image_store),
        image,
        sessions,
        RetryPolicy::new(config.image.timeout_secs, config.image.max_retries),
    ));

    Ok(Services { engine, images })
}

fn require_pool(pool: Option<&SqlitePool>) -> Result<SqlitePool> {
    pool.cloned().context("sqlite backend selected but no database pool was opened")
}

/// Create an artifact store for the configured backend.
pub async fn create_artifact_store(
    backend: CacheBackend,
    pool: Option<&SqlitePool>,
    namespace: &str,
    dir: &Path,
    extension: &str,
) -> Result<Arc<dyn ArtifactStore>> {
    Ok(match backend {
        CacheBackend::Memory => Arc::new(MemoryArtifactStore::new()),
        CacheBackend::Sqlite => {
            Arc::new(SqliteArtifactStore::new(require_pool(pool)?, namespace).await?)
        }
        CacheBackend::Directory => Arc::new(DirectoryArtifactStore::new(dir, extension).await?),
    })
}
