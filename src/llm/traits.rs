use crate::error::LlmError;
use std::future::Future;
use std::pin::Pin;

/// Which side of the conversation a history entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    Player,
    Narrator,
}

/// Interleave the turn history into request order:
/// `player[0], assistant[0], player[1], assistant[1], ...`.
///
/// `player_turns` is normally one longer than `assistant_turns` (the action
/// awaiting a reply), so the sequence ends on a player turn.
pub fn interleave_turns<'a>(
    assistant_turns: &'a [String],
    player_turns: &'a [String],
) -> Vec<(TurnRole, &'a str)> {
    let mut messages = Vec::with_capacity(assistant_turns.len() + player_turns.len());
    for (i, player) in player_turns.iter().enumerate() {
        messages.push((TurnRole::Player, player.as_str()));
        if let Some(reply) = assistant_turns.get(i) {
            messages.push((TurnRole::Narrator, reply.as_str()));
        }
    }
    messages
}

/// Produces the narrator's raw structured reply for a full turn history.
///
/// Implementations must be deterministic from the caller's point of view:
/// the same inputs are cached and never asked twice.
pub trait NarrativeClient: Send + Sync {
    /// Provider identifier (e.g. "anthropic").
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        system_prompt: &'a str,
        assistant_turns: &'a [String],
        player_turns: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

/// Turns an image prompt into encoded image bytes (PNG).
pub trait ImageClient: Send + Sync {
    /// Provider identifier (e.g. "openai").
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, LlmError>> + Send + 'a>>;
}
