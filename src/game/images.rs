use crate::cache::{Fingerprint, ResponseCache};
use crate::error::{AdventureError, Result};
use crate::llm::{ImageClient, RetryPolicy};
use crate::session::SessionStore;
use std::sync::Arc;

/// Resolves an image fingerprint to bytes, generating on first request.
///
/// Turns only schedule images; nothing is drawn until a client asks for
/// the URL. Once stored, an image is served to anyone who knows its
/// fingerprint.
pub struct ImageMaterializer {
    cache: ResponseCache,
    client: Arc<dyn ImageClient>,
    sessions: Arc<dyn SessionStore>,
    retry: RetryPolicy,
}

impl ImageMaterializer {
    pub fn new(
        cache: ResponseCache,
        client: Arc<dyn ImageClient>,
        sessions: Arc<dyn SessionStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cache,
            client,
            sessions,
            retry,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn resolve(
        &self,
        session_id: Option<&str>,
        fingerprint: &Fingerprint,
    ) -> Result<Vec<u8>> {
        if let Some(bytes) = self.cache.get(fingerprint).await? {
            return Ok(bytes);
        }

        let unknown = || AdventureError::UnknownImageReference {
            fingerprint: fingerprint.to_string(),
        };
        let session_id = session_id.ok_or_else(unknown)?;
        let session = self
            .sessions
            .load(session_id)
            .await
            .map_err(AdventureError::storage)?
            .ok_or_else(unknown)?;
        let prompt = session
            .pending_image_prompts
            .get(fingerprint.as_str())
            .ok_or_else(unknown)?
            .as_str();

        tracing::info!(
            session_id,
            fingerprint = fingerprint.as_str(),
            "materializing image"
        );
        let client = self.client.as_ref();
        self.cache
            .get_or_create(fingerprint, || async move {
                self.retry
                    .run("image", client.name(), || client.generate(prompt))
                    .await
            })
            .await
    }
}
