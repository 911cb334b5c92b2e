use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const NARRATIVE_DOMAIN: &[u8] = b"narrative/v1\n";
const IMAGE_DOMAIN: &[u8] = b"image/v1\n";

/// SHA-256 content address of a generated artifact, rendered as 64 lowercase
/// hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

#[derive(Serialize)]
struct NarrativeKey<'a> {
    system_prompt: &'a str,
    assistant_turns: &'a [String],
    player_turns: &'a [String],
}

impl Fingerprint {
    /// Address of the narrative reply for an exact conversation history.
    pub fn narrative(
        system_prompt: &str,
        assistant_turns: &[String],
        player_turns: &[String],
    ) -> Self {
        let key = NarrativeKey {
            system_prompt,
            assistant_turns,
            player_turns,
        };
        // Serializing borrowed strings and slices into a Vec cannot fail.
        let canonical = serde_json::to_vec(&key).unwrap_or_default();
        Self::digest(NARRATIVE_DOMAIN, &canonical)
    }

    /// Address of the image generated from a prompt.
    pub fn image(prompt: &str) -> Self {
        Self::digest(IMAGE_DOMAIN, prompt.as_bytes())
    }

    fn digest(domain: &[u8], payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(payload);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = anyhow::Error;

    /// Only well-formed digests parse, so a fingerprint is always safe to use
    /// as a file name or SQL key.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        anyhow::ensure!(
            value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
            "invalid fingerprint: expected 64 lowercase hex characters"
        );
        Ok(Self(value.to_string()))
    }
}
