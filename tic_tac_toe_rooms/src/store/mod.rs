//! Room snapshot persistence, keyed by room id.

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::game::models::SnapshotError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("snapshot for room {key:?} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: SnapshotError,
    },
}

impl StoreError {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Backend(_) => "StoreUnavailable",
            StoreError::Corrupt { .. } => "CorruptSnapshot",
        }
    }
}

/// Key-value access to serialized room snapshots.
///
/// Only single-key operations are atomic; callers serialize read-modify-write
/// cycles per room themselves.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites whatever is stored under `key`.
    async fn set(&self, key: &str, snapshot: String) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns whether a value was removed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}
