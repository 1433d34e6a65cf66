use crate::service::RoomService;
use crate::store::RoomStore;

use std::sync::Arc;

pub struct AppState {
    pub rooms: RoomService,
}

impl AppState {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        AppState {
            rooms: RoomService::new(store),
        }
    }
}
