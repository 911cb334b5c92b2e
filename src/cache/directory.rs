use super::fingerprint::Fingerprint;
use super::store::{ArtifactStore, CacheStats};
use anyhow::{Context, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// One file per artifact, named `<fingerprint>.<extension>`.
///
/// Writes go to a uniquely named temp file first and are linked into place,
/// so readers never observe a partial artifact and the first completed write
/// wins.
pub struct DirectoryArtifactStore {
    root: PathBuf,
    extension: String,
}

impl DirectoryArtifactStore {
    pub async fn new(root: impl Into<PathBuf>, extension: &str) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("create artifact directory {}", root.display()))?;
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root
            .join(format!("{}.{}", fingerprint.as_str(), self.extension))
    }

    async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read artifact {}", path.display())),
        }
    }
}

impl ArtifactStore for DirectoryArtifactStore {
    fn name(&self) -> &str {
        "directory"
    }

    fn get<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>> {
        Box::pin(async move { Self::read_optional(&self.path_for(fingerprint)).await })
    }

    fn put_if_absent<'a>(
        &'a self,
        fingerprint: &'a Fingerprint,
        artifact: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let target = self.path_for(fingerprint);
            if let Some(existing) = Self::read_optional(&target).await? {
                return Ok(existing);
            }

            let tmp = self
                .root
                .join(format!(".{}.{}.tmp", fingerprint.as_str(), uuid::Uuid::new_v4()));
            tokio::fs::write(&tmp, &artifact)
                .await
                .with_context(|| format!("write artifact temp file {}", tmp.display()))?;

            // hard_link fails if the target exists, which gives first-writer-wins
            // without a check-then-rename race.
            let linked = tokio::fs::hard_link(&tmp, &target).await;
            let _ = tokio::fs::remove_file(&tmp).await;
            match linked {
                Ok(()) => Ok(artifact),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => Self::read_optional(&target)
                    .await?
                    .with_context(|| format!("artifact {} vanished", target.display())),
                Err(e) => {
                    Err(e).with_context(|| format!("link artifact into {}", target.display()))
                }
            }
        })
    }

    fn stats(&self) -> Pin<Box<dyn Future<Output = Result<CacheStats>> + Send + '_>> {
        Box::pin(async move {
            let suffix = format!(".{}", self.extension);
            let mut stats = CacheStats::default();
            let mut entries = tokio::fs::read_dir(&self.root)
                .await
                .with_context(|| format!("list artifact directory {}", self.root.display()))?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with('.') || !name.ends_with(&suffix) {
                    continue;
                }
                stats.entries += 1;
                stats.bytes += entry.metadata().await?.len();
            }
            Ok(stats)
        })
    }
}
