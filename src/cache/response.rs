use super::fingerprint::Fingerprint;
use super::store::{ArtifactStore, CacheStats};
use crate::error::{AdventureError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// At-most-once generation in front of an [`ArtifactStore`].
///
/// Lookups for different fingerprints run in parallel; concurrent misses on
/// the same fingerprint queue on a per-fingerprint lock so only the first
/// caller runs the generator and the rest read its stored artifact.
pub struct ResponseCache {
    store: Arc<dyn ArtifactStore>,
    inflight: Mutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<u8>>> {
        self.store
            .get(fingerprint)
            .await
            .map_err(AdventureError::storage)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.store.stats().await.map_err(AdventureError::storage)
    }

    /// Return the artifact stored at `fingerprint`, running `generate` to
    /// produce it only if nothing is stored yet. A failed generation stores
    /// nothing.
    pub async fn get_or_create<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        generate: F,
    ) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        if let Some(hit) = self.get(fingerprint).await? {
            tracing::debug!(fingerprint = fingerprint.as_str(), "cache hit");
            return Ok(hit);
        }

        let slot = self.slot(fingerprint)?;
        let result = {
            let _guard = slot.lock().await;
            self.fill(fingerprint, generate).await
        };
        self.release(fingerprint, &slot);
        result
    }

    async fn fill<F, Fut>(&self, fingerprint: &Fingerprint, generate: F) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        // Another caller may have filled the slot while we waited.
        if let Some(hit) = self.get(fingerprint).await? {
            tracing::debug!(fingerprint = fingerprint.as_str(), "cache hit after wait");
            return Ok(hit);
        }

        tracing::info!(
            fingerprint = fingerprint.as_str(),
            store = self.store.name(),
            "cache miss, generating"
        );
        let artifact = generate().await?;
        self.store
            .put_if_absent(fingerprint, artifact)
            .await
            .map_err(AdventureError::storage)
    }

    fn slot(&self, fingerprint: &Fingerprint) -> Result<Arc<AsyncMutex<()>>> {
        let mut inflight = self
            .inflight
            .lock()
            .map_err(|_| AdventureError::Storage("inflight registry poisoned".into()))?;
        Ok(Arc::clone(
            inflight
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        ))
    }

    fn release(&self, fingerprint: &Fingerprint, slot: &Arc<AsyncMutex<()>>) {
        let Ok(mut inflight) = self.inflight.lock() else {
            return;
        };
        // The registry and this caller hold the only references: nobody is
        // queued behind us, so the slot can go.
        if Arc::strong_count(slot) <= 2 {
            inflight.remove(fingerprint);
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight.lock().map(|m| m.len()).unwrap_or_default()
    }
}
