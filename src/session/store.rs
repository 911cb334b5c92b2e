use crate::game::GameSession;
use anyhow::Result;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;
use uuid::Uuid;

/// Async session persistence contract.
///
/// `load` returns a detached copy: changes reach the store only through an
/// explicit `save`, which every backend requires after each mutation.
pub trait SessionStore: Send + Sync {
    /// Backend identifier (e.g. "memory", "sqlite").
    fn name(&self) -> &str;

    /// Persist a fresh session under a newly generated id.
    fn create<'a>(
        &'a self,
        system_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GameSession>> + Send + 'a>>;

    fn load<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GameSession>>> + Send + 'a>>;

    fn save<'a>(
        &'a self,
        session: &'a GameSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    fn delete<'a>(&'a self, id: &'a str)
    -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

    fn count(&self) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + '_>>;
}

pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Volatile in-process session table.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, GameSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, GameSession>>> {
        self.sessions
            .write()
            .map_err(|_| anyhow::anyhow!("session table lock poisoned"))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, GameSession>>> {
        self.sessions
            .read()
            .map_err(|_| anyhow::anyhow!("session table lock poisoned"))
    }
}

impl SessionStore for MemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn create<'a>(
        &'a self,
        system_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<GameSession>> + Send + 'a>> {
        Box::pin(async move {
            let session = GameSession::new(new_session_id(), system_prompt);
            self.write()?.insert(session.id.clone(), session.clone());
            Ok(session)
        })
    }

    fn load<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<GameSession>>> + Send + 'a>> {
        Box::pin(async move { Ok(self.read()?.get(id).cloned()) })
    }

    fn save<'a>(
        &'a self,
        session: &'a GameSession,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.write()?.insert(session.id.clone(), session.clone());
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>> {
        Box::pin(async move { Ok(self.write()?.remove(id).is_some()) })
    }

    fn count(&self) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + '_>> {
        Box::pin(async move { Ok(self.read()?.len() as u64) })
    }
}
