use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::game::error::GameError;
use crate::game::message::{
    CreateRoomQuery, CreatedResponse, LeaveQuery, MoveResponse, RoomResponse, RoomView,
    RoomsResponse,
};
use crate::game::models::{Play, Player};
use crate::service::{PlayerSummary, ServiceError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Service(e) => e.kind(),
            ApiError::InvalidRequest(_) => "InvalidRequest",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::InvalidRoomId) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::RoomNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(ServiceError::RoomAlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Service(ServiceError::Store(StoreError::Backend(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Service(ServiceError::Store(StoreError::Corrupt { .. })) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Service(ServiceError::Game(e)) => match e {
                GameError::InvalidPosition(_) | GameError::InvalidNickname => {
                    StatusCode::BAD_REQUEST
                }
                GameError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
                GameError::OutOfTurn { .. }
                | GameError::CellOccupied { .. }
                | GameError::SymbolTaken(_)
                | GameError::RoomFull
                | GameError::DuplicatePlayer(_) => StatusCode::CONFLICT,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("❌ {} ({})", self, self.kind());
        } else {
            warn!("⚠️ Request rejected: {} ({})", self, self.kind());
        }

        let mut body = json!({ "kind": self.kind(), "message": self.to_string() });
        if let ApiError::Service(ServiceError::Game(GameError::CellOccupied {
            free_positions,
            ..
        })) = &self
        {
            body["free_positions"] = json!(free_positions);
        }
        (status, Json(json!({ "error": body }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Tic-Tac-Toe API!" }))
}

pub async fn help() -> Json<Value> {
    Json(json!({
        "message": "This is the Tic-Tac-Toe API. Use the endpoints to manage game rooms, players, and game states.",
        "endpoints": {
            "GET /": "Welcome message",
            "GET /help": "API documentation",
            "GET /rooms": "Get all existing game rooms",
            "POST /rooms/create?room_id=": "Create a new game room",
            "GET /rooms/{room_id}": "Get game state for a specific room",
            "DELETE /rooms/{room_id}": "Delete a game room",
            "POST /rooms/{room_id}/join": "Join a game room",
            "POST /rooms/{room_id}/leave?nickname=": "Leave a game room",
            "POST /rooms/{room_id}/play": "Make a move in the game",
            "GET /stats/{nickname}": "Get player statistics"
        }
    }))
}

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> ApiResult<Json<RoomsResponse>> {
    let rooms = state.rooms.list_rooms().await?;
    Ok(Json(RoomsResponse {
        rooms: rooms.into_iter().map(RoomView::from).collect(),
    }))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CreateRoomQuery>, QueryRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Query(query) = query?;
    let room = state.rooms.create_room(query.room_id).await?;
    info!("🆕 Room {} created", room.room_id);

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Room created successfully",
            room_id: room.room_id,
        }),
    ))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<RoomView>> {
    Ok(Json(state.rooms.get_room(&room_id).await?.into()))
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.rooms.delete_room(&room_id).await?;
    Ok(Json(json!({ "message": "Room deleted successfully", "room_id": room_id })))
}

pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    payload: Result<Json<Player>, JsonRejection>,
) -> ApiResult<Json<RoomResponse>> {
    let Json(player) = payload?;
    let nickname = player.nickname.clone();
    let room = state.rooms.join(&room_id, player).await?;
    info!("✅ {} joined room {}", nickname, room_id);

    Ok(Json(RoomResponse::new("Player joined successfully", room)))
}

pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    query: Result<Query<LeaveQuery>, QueryRejection>,
) -> ApiResult<Json<RoomResponse>> {
    let Query(LeaveQuery { nickname }) = query?;
    let room = state.rooms.leave(&room_id, &nickname).await?;
    info!("👋 {} left room {}", nickname, room_id);

    Ok(Json(RoomResponse::new("Player left successfully", room)))
}

pub async fn play_move(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    payload: Result<Json<Play>, JsonRejection>,
) -> ApiResult<Json<MoveResponse>> {
    let Json(play) = payload?;
    let transition = state.rooms.play(&room_id, &play).await?;
    info!(
        "✅ Move applied: {} at {} in room {} ({:?})",
        play.nickname, play.position, room_id, transition.status
    );

    Ok(Json(transition.into()))
}

pub async fn player_stats(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> ApiResult<Json<PlayerSummary>> {
    Ok(Json(state.rooms.player_stats(&nickname).await?))
}
