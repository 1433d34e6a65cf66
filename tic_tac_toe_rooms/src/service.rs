//! Transport independent room operations.
//!
//! Each mutating call holds the room's lock across load, engine call and
//! store write, so the engine never sees a stale snapshot.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::game::engine::{Engine, Transition};
use crate::game::error::GameError;
use crate::game::models::{GameState, Play, Player};
use crate::locks::RoomLocks;
use crate::store::{RoomStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("room {0:?} not found")]
    RoomNotFound(String),
    #[error("room {0:?} already exists")]
    RoomAlreadyExists(String),
    #[error("room id must not be empty")]
    InvalidRoomId,
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Game(e) => e.kind(),
            ServiceError::Store(e) => e.kind(),
            ServiceError::RoomNotFound(_) => "RoomNotFound",
            ServiceError::RoomAlreadyExists(_) => "RoomAlreadyExists",
            ServiceError::InvalidRoomId => "InvalidRoomId",
        }
    }
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// A nickname's totals summed over every room it has played in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub nickname: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub rooms: Vec<String>,
}

pub struct RoomService {
    store: Arc<dyn RoomStore>,
    locks: RoomLocks,
    engine: Engine,
}

impl RoomService {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            locks: RoomLocks::new(),
            engine: Engine::new(),
        }
    }

    /// Creates a room; a missing id gets a fresh UUID.
    #[instrument(skip(self))]
    pub async fn create_room(&self, room_id: Option<String>) -> Result<GameState> {
        let room_id = match room_id {
            Some(id) if id.trim().is_empty() => return Err(ServiceError::InvalidRoomId),
            Some(id) => id,
            None => Uuid::new_v4().to_string(),
        };

        let _guard = self.locks.acquire(&room_id).await;
        if self.store.exists(&room_id).await? {
            warn!(%room_id, "Room already exists");
            return Err(ServiceError::RoomAlreadyExists(room_id));
        }

        let state = self.engine.create_room(room_id);
        self.save(&state).await?;
        info!(room_id = %state.room_id, "Room created");
        Ok(state)
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<GameState> {
        self.load(room_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<GameState>> {
        let mut rooms = Vec::new();
        for key in self.store.list_keys().await? {
            match self.store.get(&key).await? {
                Some(raw) => rooms.push(decode(&key, &raw)?),
                None => debug!(room_id = %key, "Room vanished while listing"),
            }
        }
        Ok(rooms)
    }

    #[instrument(skip(self))]
    pub async fn delete_room(&self, room_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(room_id).await;
        if !self.store.delete(room_id).await? {
            return Err(ServiceError::RoomNotFound(room_id.to_string()));
        }
        info!(room_id, "Room deleted");
        Ok(())
    }

    #[instrument(skip(self, player), fields(nickname = %player.nickname, symbol = %player.symbol))]
    pub async fn join(&self, room_id: &str, player: Player) -> Result<GameState> {
        let (state, ()) = self
            .update(room_id, |engine, state| {
                Ok((engine.add_player(state, player)?, ()))
            })
            .await?;
        info!(room_id, players = state.players.len(), "Player joined");
        Ok(state)
    }

    #[instrument(skip(self))]
    pub async fn leave(&self, room_id: &str, nickname: &str) -> Result<GameState> {
        let (state, ()) = self
            .update(room_id, |engine, state| {
                Ok((engine.remove_player(state, nickname)?, ()))
            })
            .await?;
        info!(room_id, nickname, "Player left");
        Ok(state)
    }

    #[instrument(skip(self, play), fields(nickname = %play.nickname, position = play.position))]
    pub async fn play(&self, room_id: &str, play: &Play) -> Result<Transition> {
        let (_, transition) = self
            .update(room_id, |engine, state| {
                let transition = engine.apply_move(state, play)?;
                Ok((transition.state.clone(), transition))
            })
            .await?;
        debug!(room_id, status = ?transition.status, "Move processed");
        Ok(transition)
    }

    #[instrument(skip(self))]
    pub async fn player_stats(&self, nickname: &str) -> Result<PlayerSummary> {
        let mut summary = PlayerSummary {
            nickname: nickname.to_string(),
            wins: 0,
            losses: 0,
            draws: 0,
            rooms: Vec::new(),
        };
        for room in self.list_rooms().await? {
            if let Some(stats) = room.players_stats.get(nickname) {
                summary.wins += stats.wins;
                summary.losses += stats.losses;
                summary.draws += stats.draws;
                summary.rooms.push(room.room_id);
            }
        }

        if summary.rooms.is_empty() {
            return Err(GameError::PlayerNotFound(nickname.to_string()).into());
        }
        Ok(summary)
    }

    /// Load, transform and persist one room under its lock. Nothing is
    /// written when the engine rejects the command.
    async fn update<T, F>(&self, room_id: &str, op: F) -> Result<(GameState, T)>
    where
        F: FnOnce(&Engine, GameState) -> Result<(GameState, T), GameError>,
    {
        let _guard = self.locks.acquire(room_id).await;
        let state = self.load(room_id).await?;
        let (state, out) = op(&self.engine, state).inspect_err(|e| {
            debug!(room_id, kind = e.kind(), error = %e, "Command rejected");
        })?;
        self.save(&state).await?;
        Ok((state, out))
    }

    async fn load(&self, room_id: &str) -> Result<GameState> {
        let raw = self
            .store
            .get(room_id)
            .await?
            .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))?;
        Ok(decode(room_id, &raw)?)
    }

    async fn save(&self, state: &GameState) -> Result<()> {
        let raw = state.to_snapshot().map_err(|source| StoreError::Corrupt {
            key: state.room_id.clone(),
            source,
        })?;
        self.store.set(&state.room_id, raw).await?;
        Ok(())
    }
}

fn decode(key: &str, raw: &str) -> Result<GameState, StoreError> {
    GameState::from_snapshot(raw).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })
}
