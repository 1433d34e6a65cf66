use serde::{Deserialize, Serialize};

use super::engine::{GameStatus, Transition};
use super::models::{Board, GameState, Phase};

#[derive(Debug, Default, Deserialize)]
pub struct CreateRoomQuery {
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LeaveQuery {
    pub nickname: String,
}

/// A room snapshot as served to clients, with its derived phase.
#[derive(Debug, Clone, Serialize)]
pub struct RoomView {
    #[serde(flatten)]
    pub state: GameState,
    pub phase: Phase,
}

impl From<GameState> for RoomView {
    fn from(state: GameState) -> Self {
        let phase = state.phase();
        Self { state, phase }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    pub rooms: Vec<RoomView>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub room_id: String,
}

#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub message: &'static str,
    pub room_id: String,
    pub room: RoomView,
}

impl RoomResponse {
    pub fn new(message: &'static str, state: GameState) -> Self {
        Self {
            message,
            room_id: state.room_id.clone(),
            room: state.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub message: &'static str,
    pub room_id: String,
    #[serde(flatten)]
    pub status: GameStatus,
    pub board: Board,
    pub room: RoomView,
}

impl From<Transition> for MoveResponse {
    fn from(t: Transition) -> Self {
        let message = match t.status {
            GameStatus::Win { .. } => "Game over, resetting the game",
            GameStatus::Draw => "Game over, it's a draw, resetting the game",
            GameStatus::Ongoing { .. } => "Move played successfully",
        };
        Self {
            message,
            room_id: t.state.room_id.clone(),
            status: t.status,
            board: t.board,
            room: t.state.into(),
        }
    }
}
