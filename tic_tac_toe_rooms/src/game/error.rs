use thiserror::Error;

use super::models::Symbol;

/// Rule violations raised by the engine. None of them touch the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("position {0} is outside the board (0-8)")]
    InvalidPosition(i64),
    #[error("player {0:?} is not in the room")]
    PlayerNotFound(String),
    #[error("it's not {nickname:?}'s turn, {turn} plays next")]
    OutOfTurn { nickname: String, turn: Symbol },
    #[error("position {position} is already taken, free positions: {free_positions:?}")]
    CellOccupied {
        position: usize,
        free_positions: Vec<usize>,
    },
    #[error("symbol {0} is already taken by another player")]
    SymbolTaken(Symbol),
    #[error("room is full")]
    RoomFull,
    #[error("player {0:?} is already in the room")]
    DuplicatePlayer(String),
    #[error("nickname must not be empty")]
    InvalidNickname,
}

impl GameError {
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::InvalidPosition(_) => "InvalidPosition",
            GameError::PlayerNotFound(_) => "PlayerNotFound",
            GameError::OutOfTurn { .. } => "OutOfTurn",
            GameError::CellOccupied { .. } => "CellOccupied",
            GameError::SymbolTaken(_) => "SymbolTaken",
            GameError::RoomFull => "RoomFull",
            GameError::DuplicatePlayer(_) => "DuplicatePlayer",
            GameError::InvalidNickname => "InvalidNickname",
        }
    }
}
