use super::markup;
use super::reply::TurnReply;
use crate::cache::Fingerprint;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Player action recorded for the opening turn. It is also the first user
/// message every narrative request starts with.
pub const OPENING_ACTION: &str = "new game";

/// Per-player game state, exclusively owned by one interaction stream.
///
/// `assistant_turns[i]` is the reply to `player_turns[i]`; the two have equal
/// length whenever no turn is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id: String,
    pub system_prompt: String,
    #[serde(default)]
    pub assistant_turns: Vec<String>,
    #[serde(default)]
    pub player_turns: Vec<String>,
    #[serde(default)]
    pub inventory: BTreeSet<String>,
    #[serde(default)]
    pub visible_objects: BTreeSet<String>,
    /// Image fingerprint (hex) → prompt text, waiting to be materialized.
    #[serde(default)]
    pub pending_image_prompts: BTreeMap<String, String>,
    /// Story text of the most recent turn that was not rolled back.
    #[serde(default)]
    pub last_story_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl GameSession {
    pub fn new(id: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            system_prompt: system_prompt.into(),
            assistant_turns: Vec::new(),
            player_turns: Vec::new(),
            inventory: BTreeSet::new(),
            visible_objects: BTreeSet::new(),
            pending_image_prompts: BTreeMap::new(),
            last_story_text: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn turn_count(&self) -> usize {
        self.assistant_turns.len()
    }

    pub fn is_balanced(&self) -> bool {
        self.assistant_turns.len() == self.player_turns.len()
    }

    /// Fold a parsed reply into the session. `raw` is the exact model output,
    /// kept verbatim so later requests replay the same history.
    ///
    /// Returns the fingerprint of the scheduled image, if any.
    pub(crate) fn apply_reply(&mut self, raw: &str, reply: &TurnReply) -> Option<Fingerprint> {
        if reply.no_progress {
            // The tentative action never happened as far as the model is concerned.
            self.player_turns.pop();
        } else {
            self.assistant_turns.push(raw.to_string());
            self.last_story_text = Some(reply.story_text.clone());
        }

        self.reconcile_objects(reply);
        self.reconcile_inventory(reply);
        self.touch();

        reply.image_prompt.as_deref().map(|prompt| {
            let fingerprint = Fingerprint::image(prompt);
            self.pending_image_prompts
                .insert(fingerprint.to_string(), prompt.to_string());
            fingerprint
        })
    }

    /// reset (on new scene) → add markers from text → subtract removed.
    fn reconcile_objects(&mut self, reply: &TurnReply) {
        if reply.new_scene {
            self.visible_objects.clear();
        }
        self.visible_objects.extend(
            markup::objects(&reply.story_text)
                .into_iter()
                .map(ToString::to_string),
        );
        for removed in &reply.remove_objects {
            self.visible_objects.remove(removed);
        }
    }

    fn reconcile_inventory(&mut self, reply: &TurnReply) {
        self.inventory.extend(reply.new_items.iter().cloned());
        for removed in &reply.remove_items {
            self.inventory.remove(removed);
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }

    pub fn inventory_sorted(&self) -> Vec<String> {
        self.inventory.iter().cloned().collect()
    }

    pub fn objects_sorted(&self) -> Vec<String> {
        self.visible_objects.iter().cloned().collect()
    }
}
