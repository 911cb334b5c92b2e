pub mod locks;
pub mod sqlite;
pub mod store;

pub use locks::{SessionGuard, SessionLocks};
pub use sqlite::SqliteSessionStore;
pub use store::{MemorySessionStore, SessionStore, new_session_id};
