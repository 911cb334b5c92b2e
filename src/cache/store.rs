use super::fingerprint::Fingerprint;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

/// Entry and byte totals reported by an artifact store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub bytes: u64,
}

/// Content-addressed persistence contract for generated artifacts.
///
/// Entries are immutable and never expire. `put_if_absent` is
/// first-writer-wins: it returns whatever is stored after the call, which is
/// the caller's artifact only when nothing was there before.
pub trait ArtifactStore: Send + Sync {
    /// Backend identifier (e.g. "memory", "sqlite").
    fn name(&self) -> &str;

    fn get<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>>;

    fn put_if_absent<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
        artifact: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

    fn stats(&self) -> Pin<Box<dyn Future<Output = Result<CacheStats>> + Send + '_>>;
}

/// Volatile store, lifetime = process lifetime.
#[derive(Default)]
pub struct MemoryArtifactStore {
    entries: RwLock<HashMap<Fingerprint, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>> {
        Box::pin(async move {
            let entries = self
                .entries
                .read()
                .map_err(|_| anyhow::anyhow!("artifact store lock poisoned"))?;
            Ok(entries.get(fingerprint).cloned())
        })
    }

    fn put_if_absent<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
        artifact: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| anyhow::anyhow!("artifact store lock poisoned"))?;
            Ok(entries
                .entry(fingerprint.clone())
                .or_insert(artifact)
                .clone())
        })
    }

    fn stats(&self) -> Pin<Box<dyn Future<Output = Result<CacheStats>> + Send + '_>> {
        Box::pin(async move {
            let entries = self
                .entries
                .read()
                .map_err(|_| anyhow::anyhow!("artifact store lock poisoned"))?;
            Ok(CacheStats {
                entries: entries.len() as u64,
                bytes: entries.values().map(|v| v.len() as u64).sum(),
            })
        })
    }
}
