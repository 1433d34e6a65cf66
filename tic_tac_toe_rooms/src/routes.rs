use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::game::handlers;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/help", get(handlers::help))
        .route("/rooms", get(handlers::list_rooms))
        .route("/rooms/create", post(handlers::create_room))
        .route(
            "/rooms/{room_id}",
            get(handlers::get_room).delete(handlers::delete_room),
        )
        .route("/rooms/{room_id}/join", post(handlers::join_room))
        .route("/rooms/{room_id}/leave", post(handlers::leave_room))
        .route("/rooms/{room_id}/play", post(handlers::play_move))
        .route("/stats/{nickname}", get(handlers::player_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
