//! WebSocket message DTOs.
//!
//! Every frame is a JSON object internally tagged by `type`, using the
//! whiteboard's event names (`"draw start"`, `"users list update"`, ...).

use serde::{Deserialize, Serialize};

// ========================================
// Client → Server
// ========================================

/// Inbound message from a client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "authenticate")]
    Authenticate {
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(rename = "create room")]
    CreateRoom {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    #[serde(rename = "join room")]
    JoinRoom {
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    #[serde(rename = "request room state")]
    RequestRoomState {
        #[serde(default)]
        room: Option<String>,
    },
    #[serde(rename = "get rooms")]
    GetRooms {},
    #[serde(rename = "draw start")]
    DrawStart(DrawPayload),
    #[serde(rename = "draw continue")]
    DrawContinue(DrawPayload),
    #[serde(rename = "draw end")]
    DrawEnd(DrawEndPayload),
    #[serde(rename = "clear canvas")]
    ClearCanvas {},
}

impl ClientMessage {
    /// Event name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Authenticate { .. } => "authenticate",
            ClientMessage::CreateRoom { .. } => "create room",
            ClientMessage::JoinRoom { .. } => "join room",
            ClientMessage::RequestRoomState { .. } => "request room state",
            ClientMessage::GetRooms {} => "get rooms",
            ClientMessage::DrawStart(_) => "draw start",
            ClientMessage::DrawContinue(_) => "draw continue",
            ClientMessage::DrawEnd(_) => "draw end",
            ClientMessage::ClearCanvas {} => "clear canvas",
        }
    }
}

/// Payload of `draw start` / `draw continue`, relayed verbatim to the other members.
///
/// `strokeId` is opaque: clients send strings or numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_id: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawEndPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_id: Option<serde_json::Value>,
}

// ========================================
// Server → Client
// ========================================

/// Outbound message to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    #[serde(rename = "authenticated")]
    Authenticated { user: UserDto },
    #[serde(rename = "authentication error")]
    AuthenticationError { error: String },
    #[serde(rename = "room created")]
    RoomCreated { room: String, is_private: bool },
    #[serde(rename = "room creation error")]
    RoomCreationError { error: String },
    #[serde(rename = "room joined")]
    RoomJoined { room: String },
    #[serde(rename = "join room error")]
    JoinRoomError { error: String },
    #[serde(rename = "room state")]
    RoomState { strokes: Vec<StrokeDto> },
    #[serde(rename = "rooms list")]
    RoomsList { rooms: Vec<RoomListItemDto> },
    #[serde(rename = "users list update")]
    UsersListUpdate { users: Vec<PresenceDto> },
    #[serde(rename = "draw start")]
    DrawStart { data: DrawPayload, user_id: String },
    #[serde(rename = "draw continue")]
    DrawContinue { data: DrawPayload, user_id: String },
    #[serde(rename = "draw end")]
    DrawEnd { data: DrawEndPayload, user_id: String },
    #[serde(rename = "clear canvas")]
    ClearCanvas {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDto {
    pub x: f64,
    pub y: f64,
}

/// Stroke as sent in `room state`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeDto {
    pub user_id: String,
    pub stroke_id: String,
    pub color: Option<String>,
    pub size: Option<f64>,
    pub points: Vec<PointDto>,
}

/// Entry of `rooms list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListItemDto {
    pub name: String,
    pub user_count: usize,
    pub stroke_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    pub created_at: String,
    pub last_activity: String,
}

/// Entry of `users list update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceDto {
    pub id: String,
    pub name: String,
    pub authenticated: bool,
}
