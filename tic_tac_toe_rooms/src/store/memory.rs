use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{RoomStore, StoreError};

/// Process-local store, for tests and single-node runs without Redis.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.rooms.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, snapshot: String) -> Result<(), StoreError> {
        self.rooms.write().await.insert(key.to_string(), snapshot);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.read().await.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.rooms.write().await.remove(key).is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.rooms.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
