//! Room based tic-tac-toe service.
//!
//! The [`game::engine`] holds the rules and works on owned snapshots only.
//! [`service::RoomService`] wraps it with per-room locking and a
//! [`store::RoomStore`], and [`routes::router`] exposes that over HTTP.

pub mod app_state;
pub mod config;
pub mod game;
pub mod locks;
pub mod routes;
pub mod service;
pub mod store;

pub use game::engine::{Engine, GameStatus, Transition};
pub use game::error::GameError;
pub use game::models::{Board, Cell, GameState, Phase, Play, Player, PlayerStats, Symbol};
pub use service::{RoomService, ServiceError};
