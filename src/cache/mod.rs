pub mod directory;
pub mod fingerprint;
pub mod response;
pub mod sqlite;
pub mod store;

pub use directory::DirectoryArtifactStore;
pub use fingerprint::Fingerprint;
pub use response::ResponseCache;
pub use sqlite::SqliteArtifactStore;
pub use store::{ArtifactStore, CacheStats, MemoryArtifactStore};
