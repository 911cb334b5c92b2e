use super::http_client::build_provider_client_with_timeout;
use super::scrub::{api_error, request_error};
use super::traits::ImageClient;
use crate::config::ImageConfig;
use crate::error::LlmError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Image client for the OpenAI images endpoint. Requests base64 output so
/// the bytes come back in the same response.
pub struct OpenAiImageClient {
    api_key: Option<String>,
    generations_url: String,
    model: String,
    size: String,
    quality: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
    response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    b64_json: Option<String>,
}

impl OpenAiImageClient {
    pub fn new(config: &ImageConfig) -> Self {
        let base = config
            .base_url
            .as_deref()
            .map_or(DEFAULT_BASE_URL, |u| u.trim_end_matches('/'));
        Self {
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            generations_url: format!("{base}/v1/images/generations"),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
            client: build_provider_client_with_timeout(config.timeout_secs.saturating_add(5)),
        }
    }

    fn decode(response: GenerationResponse) -> Result<Vec<u8>, LlmError> {
        let encoded = response
            .data
            .into_iter()
            .find_map(|image| image.b64_json)
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: PROVIDER.into(),
            })?;
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                message: format!("invalid base64 image payload: {e}"),
            })
    }
}

impl ImageClient for OpenAiImageClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredentials {
                provider: PROVIDER.into(),
                hint: "set OPENAI_API_KEY or [image] api_key",
            })?;

            let request = GenerationRequest {
                model: &self.model,
                prompt,
                size: &self.size,
                quality: &self.quality,
                n: 1,
                response_format: "b64_json",
            };

            tracing::debug!(model = self.model.as_str(), "calling openai image api");

            let response = self
                .client
                .post(&self.generations_url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| request_error(PROVIDER, &e))?;

            if !response.status().is_success() {
                return Err(api_error(PROVIDER, response).await);
            }

            let body: GenerationResponse = response
                .json()
                .await
                .map_err(|e| request_error(PROVIDER, &e))?;
            Self::decode(body)
        })
    }
}
