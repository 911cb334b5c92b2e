use crate::error::{AdventureError, Result};
use serde::Deserialize;

/// Structured reply the narrative model returns for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub story_text: String,
    /// The player's action changed nothing; the turn is rolled back.
    pub no_progress: bool,
    /// The scene changed; previously visible objects are dropped.
    pub new_scene: bool,
    pub new_items: Vec<String>,
    pub remove_items: Vec<String>,
    pub remove_objects: Vec<String>,
    pub image_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTurnReply {
    story_text: String,
    no_progress: bool,
    new_scene: bool,
    #[serde(default)]
    new_items: Vec<String>,
    #[serde(default)]
    remove_items: Vec<String>,
    #[serde(default)]
    remove_objects: Vec<String>,
    #[serde(default)]
    image_prompt: Option<String>,
}

impl TurnReply {
    /// Validate raw model output against the reply schema.
    ///
    /// Models sometimes wrap the JSON object in prose or a code fence, so
    /// exactly one object is read from the first `{` and anything after it
    /// is ignored. Every failure is a [`AdventureError::MalformedReply`].
    pub fn parse(raw: &str) -> Result<Self> {
        let reply = first_json_object(raw)?;

        let story_text = reply.story_text.trim().to_string();
        if story_text.is_empty() {
            return Err(AdventureError::malformed("story_text is empty"));
        }

        Ok(Self {
            story_text,
            no_progress: reply.no_progress,
            new_scene: reply.new_scene,
            new_items: clean_names(reply.new_items),
            remove_items: clean_names(reply.remove_items),
            remove_objects: clean_names(reply.remove_objects),
            image_prompt: reply
                .image_prompt
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

fn first_json_object(raw: &str) -> Result<RawTurnReply> {
    let start = raw
        .find('{')
        .ok_or_else(|| AdventureError::malformed("no JSON object in reply"))?;
    serde_json::Deserializer::from_str(&raw[start..])
        .into_iter::<RawTurnReply>()
        .next()
        .ok_or_else(|| AdventureError::malformed("no JSON object in reply"))?
        .map_err(|e| AdventureError::malformed(e.to_string()))
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
