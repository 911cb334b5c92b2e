use super::reply::TurnReply;
use crate::cache::{Fingerprint, ResponseCache};
use crate::error::{AdventureError, Result};
use crate::llm::{NarrativeClient, RetryPolicy};
use std::sync::Arc;

/// Times a reply that fails validation is generated again before the turn
/// fails with [`AdventureError::MalformedReply`].
const REGENERATE_ON_MALFORMED: usize = 1;

/// The only path from a turn history to a validated [`TurnReply`].
///
/// Identical histories are answered from the continuation cache; only
/// replies that pass validation are ever written to it.
pub struct Narrator {
    cache: ResponseCache,
    client: Arc<dyn NarrativeClient>,
    retry: RetryPolicy,
}

impl Narrator {
    pub fn new(cache: ResponseCache, client: Arc<dyn NarrativeClient>, retry: RetryPolicy) -> Self {
        Self {
            cache,
            client,
            retry,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Raw model text (stored verbatim in the history) and its parsed form.
    pub async fn reply_for(
        &self,
        system_prompt: &str,
        assistant_turns: &[String],
        player_turns: &[String],
    ) -> Result<(String, TurnReply)> {
        let fingerprint = Fingerprint::narrative(system_prompt, assistant_turns, player_turns);
        let bytes = self
            .cache
            .get_or_create(&fingerprint, || {
                self.generate_valid(system_prompt, assistant_turns, player_turns)
            })
            .await?;

        let raw = String::from_utf8(bytes)
            .map_err(|_| AdventureError::malformed("cached reply is not UTF-8"))?;
        let reply = TurnReply::parse(&raw)?;
        Ok((raw, reply))
    }

    async fn generate_valid(
        &self,
        system_prompt: &str,
        assistant_turns: &[String],
        player_turns: &[String],
    ) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            let raw = self
                .retry
                .run("narrative", self.client.name(), || {
                    self.client
                        .generate(system_prompt, assistant_turns, player_turns)
                })
                .await?;

            match TurnReply::parse(&raw) {
                Ok(_) => return Ok(raw.into_bytes()),
                Err(err) if attempt < REGENERATE_ON_MALFORMED => {
                    tracing::warn!(
                        provider = self.client.name(),
                        turn = player_turns.len(),
                        "narrative reply failed validation, regenerating: {err}"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
