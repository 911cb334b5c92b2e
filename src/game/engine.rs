use super::narrator::Narrator;
use super::session::{GameSession, OPENING_ACTION};
use crate::cache::Fingerprint;
use crate::error::{AdventureError, Result};
use crate::session::{SessionLocks, SessionStore};
use serde::Serialize;
use std::sync::Arc;

/// What the player sees after a turn (or a rejected action).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub image_url: Option<String>,
    pub new_scene: bool,
    pub story_text: String,
    pub inventory: Vec<String>,
    pub objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartedSession {
    pub session_id: String,
    #[serde(flatten)]
    pub outcome: TurnOutcome,
}

/// Relative URL under which the gateway serves a scheduled image.
pub fn image_url(fingerprint: &Fingerprint, session_id: &str) -> String {
    format!("image/{fingerprint}.png?session={session_id}")
}

/// The session state machine.
///
/// Every mutating operation holds the session's lock across
/// load → advance → save, and works on a loaded copy that is written back
/// only when the whole turn succeeded.
pub struct AdventureEngine {
    sessions: Arc<dyn SessionStore>,
    narrator: Narrator,
    locks: SessionLocks,
    system_prompt: String,
}

impl AdventureEngine {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        narrator: Narrator,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            narrator,
            locks: SessionLocks::new(),
            system_prompt: system_prompt.into(),
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Create and persist a session, then play its opening turn.
    ///
    /// If the opening turn fails the session is deleted again, since its id
    /// never reaches the caller.
    pub async fn start_session(&self) -> Result<StartedSession> {
        let session = self
            .sessions
            .create(&self.system_prompt)
            .await
            .map_err(AdventureError::storage)?;
        tracing::info!(session_id = session.id.as_str(), "session created");

        let outcome = match self.advance(&session.id, None).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(delete_err) = self.sessions.delete(&session.id).await {
                    tracing::warn!(
                        session_id = session.id.as_str(),
                        "failed to discard session after failed opening: {delete_err}"
                    );
                }
                return Err(e);
            }
        };
        Ok(StartedSession {
            session_id: session.id,
            outcome,
        })
    }

    /// Run one turn. `None` plays the opening action.
    pub async fn advance(&self, session_id: &str, action: Option<String>) -> Result<TurnOutcome> {
        let _guard = self.locks.acquire(session_id).await;
        let session = self.load(session_id).await?;
        self.advance_locked(session, action).await
    }

    /// Guarded `use {item} on {object}`. A rejected action returns the
    /// unchanged state with a message and never reaches the model.
    pub async fn act(&self, session_id: &str, item: &str, object: &str) -> Result<TurnOutcome> {
        let (item, object) = (item.trim(), object.trim());
        let _guard = self.locks.acquire(session_id).await;
        let session = self.load(session_id).await?;

        if !session.inventory.contains(item) {
            tracing::debug!(session_id, item, "action rejected: item not carried");
            return Ok(rejection(&session, format!("You have no {item}.")));
        }
        if !session.visible_objects.contains(object) {
            tracing::debug!(session_id, object, "action rejected: object not present");
            return Ok(rejection(&session, format!("There is no {object} here.")));
        }

        self.advance_locked(session, Some(format!("use {item} on {object}")))
            .await
    }

    /// Current inventory and objects with the last story text. No mutation.
    pub async fn snapshot(&self, session_id: &str) -> Result<TurnOutcome> {
        let session = self.load(session_id).await?;
        Ok(TurnOutcome {
            image_url: None,
            new_scene: false,
            story_text: session.last_story_text.clone().unwrap_or_default(),
            inventory: session.inventory_sorted(),
            objects: session.objects_sorted(),
        })
    }

    async fn load(&self, session_id: &str) -> Result<GameSession> {
        self.sessions
            .load(session_id)
            .await
            .map_err(AdventureError::storage)?
            .ok_or_else(|| AdventureError::SessionNotFound(session_id.to_string()))
    }

    async fn advance_locked(
        &self,
        mut session: GameSession,
        action: Option<String>,
    ) -> Result<TurnOutcome> {
        let action = action.unwrap_or_else(|| OPENING_ACTION.to_string());
        tracing::info!(
            session_id = session.id.as_str(),
            turn = session.player_turns.len(),
            action = action.as_str(),
            "advancing session"
        );
        session.player_turns.push(action);

        let (raw, reply) = self
            .narrator
            .reply_for(
                &session.system_prompt,
                &session.assistant_turns,
                &session.player_turns,
            )
            .await
            .inspect_err(|e| {
                tracing::warn!(session_id = session.id.as_str(), "turn failed: {e}");
            })?;

        let image = session.apply_reply(&raw, &reply);
        self.sessions
            .save(&session)
            .await
            .map_err(AdventureError::storage)?;

        if reply.no_progress {
            tracing::debug!(session_id = session.id.as_str(), "no progress, action rolled back");
        }

        Ok(TurnOutcome {
            image_url: image.map(|fp| image_url(&fp, &session.id)),
            new_scene: reply.new_scene,
            story_text: reply.story_text,
            inventory: session.inventory_sorted(),
            objects: session.objects_sorted(),
        })
    }
}

fn rejection(session: &GameSession, message: String) -> TurnOutcome {
    TurnOutcome {
        image_url: None,
        new_scene: false,
        story_text: message,
        inventory: session.inventory_sorted(),
        objects: session.objects_sorted(),
    }
}
