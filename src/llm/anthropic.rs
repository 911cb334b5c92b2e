use super::http_client::build_provider_client_with_timeout;
use super::scrub::{api_error, request_error};
use super::traits::{NarrativeClient, TurnRole, interleave_turns};
use crate::config::NarrativeConfig;
use crate::error::LlmError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

const PROVIDER: &str = "anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Narrative client for the Anthropic Messages API.
pub struct AnthropicNarrativeClient {
    api_key: Option<String>,
    messages_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

impl AnthropicNarrativeClient {
    pub fn new(config: &NarrativeConfig) -> Self {
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
            messages_url: format!("{base}/v1/messages"),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client: build_provider_client_with_timeout(config.timeout_secs.saturating_add(5)),
        }
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        assistant_turns: &'a [String],
        player_turns: &'a [String],
    ) -> ChatRequest<'a> {
        let messages = interleave_turns(assistant_turns, player_turns)
            .into_iter()
            .map(|(role, content)| Message {
                role: match role {
                    TurnRole::Player => "user",
                    TurnRole::Narrator => "assistant",
                },
                content,
            })
            .collect();

        ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages,
            temperature: self.temperature,
        }
    }

    fn extract_text(response: ChatResponse) -> Result<String, LlmError> {
        let text = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            Err(LlmError::EmptyResponse {
                provider: PROVIDER.into(),
            })
        } else {
            Ok(text)
        }
    }
}

impl NarrativeClient for AnthropicNarrativeClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate<'a>(
        &'a self,
        system_prompt: &'a str,
        assistant_turns: &'a [String],
        player_turns: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(async move {
            let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredentials {
                provider: PROVIDER.into(),
                hint: "set ANTHROPIC_API_KEY or [narrative] api_key",
            })?;
            let request = self.build_request(system_prompt, assistant_turns, player_turns);

            tracing::debug!(
                model = self.model.as_str(),
                messages = request.messages.len(),
                "calling anthropic messages api"
            );

            let response = self
                .client
                .post(&self.messages_url)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .header("x-api-key", api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| request_error(PROVIDER, &e))?;

            if !response.status().is_success() {
                return Err(api_error(PROVIDER, response).await);
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| request_error(PROVIDER, &e))?;
            Self::extract_text(chat_response)
        })
    }
}
