//! Axum handlers for the WebSocket endpoint and the REST API.

mod http;
mod websocket;

pub use http::{
    ApiError, SESSION_COOKIE, create_room, get_room_detail, get_rooms, get_stats, get_user,
    health_check, update_nickname,
};
pub use websocket::websocket_handler;
