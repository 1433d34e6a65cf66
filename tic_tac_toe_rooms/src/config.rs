use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::info;

use crate::store::{MemoryStore, RedisStore, RoomStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Snapshots live in Redis.
    Redis,
    /// Snapshots live in process memory and vanish on exit.
    Memory,
}

/// Room based tic-tac-toe server.
#[derive(Debug, Clone, Parser)]
#[command(name = "tic_tac_toe_rooms", version)]
pub struct Config {
    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Where room snapshots are kept
    #[arg(long, env = "ROOM_STORE", value_enum, default_value_t = StoreKind::Redis)]
    pub store: StoreKind,

    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub redis_url: String,

    /// Prepended to every room id to form the Redis key
    #[arg(long, env = "ROOM_KEY_PREFIX", default_value = "room:")]
    pub key_prefix: String,

    /// Log filter, e.g. `info` or `tic_tac_toe_rooms=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn open_store(&self) -> Result<Arc<dyn RoomStore>, StoreError> {
        match self.store {
            StoreKind::Redis => {
                info!(url = %self.redis_url, prefix = %self.key_prefix, "Using Redis room store");
                Ok(Arc::new(
                    RedisStore::connect(&self.redis_url, &self.key_prefix).await?,
                ))
            }
            StoreKind::Memory => {
                info!("Using in-memory room store");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "tic_tac_toe_rooms",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--store",
            "memory",
            "--key-prefix",
            "ttt:",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.key_prefix, "ttt:");
        assert_eq!(config.log, "debug");
    }

    #[test]
    fn rejects_unknown_store() {
        assert!(Config::try_parse_from(["tic_tac_toe_rooms", "--store", "sqlite"]).is_err());
    }

    #[tokio::test]
    async fn memory_store_opens_without_redis() {
        let config =
            Config::try_parse_from(["tic_tac_toe_rooms", "--store", "memory"]).unwrap();
        let store = config.open_store().await.unwrap();
        assert!(store.list_keys().await.unwrap().is_empty());
    }
}
