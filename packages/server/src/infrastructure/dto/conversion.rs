//! Conversion logic between DTOs and domain entities.

use rakugaki_shared::time::millis_to_rfc3339;

use crate::domain::{PresenceEntry, RoomSummary, Stroke, StrokeId, User};
use crate::infrastructure::dto::{http, websocket as dto};
use crate::usecase::ServerStats;

// ========================================
// DTO → Domain
// ========================================

/// Opaque client stroke id: strings are used as-is, numbers by their JSON text,
/// anything else (or missing) becomes the empty key.
pub fn stroke_id_from(value: Option<&serde_json::Value>) -> StrokeId {
    match value {
        Some(serde_json::Value::String(s)) => StrokeId::new(s.clone()),
        Some(serde_json::Value::Number(n)) => StrokeId::new(n.to_string()),
        _ => StrokeId::unspecified(),
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<Stroke> for dto::StrokeDto {
    fn from(model: Stroke) -> Self {
        Self {
            user_id: model.author.into_string(),
            stroke_id: model.id.as_str().to_string(),
            color: model.style.color,
            size: model.style.size,
            points: model
                .points
                .into_iter()
                .map(|p| dto::PointDto { x: p.x, y: p.y })
                .collect(),
        }
    }
}

impl From<PresenceEntry> for dto::PresenceDto {
    fn from(model: PresenceEntry) -> Self {
        Self {
            id: model.id.into_string(),
            name: model.name,
            authenticated: model.authenticated,
        }
    }
}

impl From<User> for dto::UserDto {
    fn from(model: User) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            nickname: model.nickname,
        }
    }
}

impl From<RoomSummary> for dto::RoomListItemDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            name: model.name.into_string(),
            user_count: model.member_count,
            stroke_count: model.stroke_count,
            is_private: model.is_private,
            created_at: millis_to_rfc3339(model.created_at.value()),
            last_activity: millis_to_rfc3339(model.last_activity.value()),
        }
    }
}

impl From<RoomSummary> for http::RoomDetailDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            name: model.name.into_string(),
            user_count: model.member_count,
            stroke_count: model.stroke_count,
            created_at: millis_to_rfc3339(model.created_at.value()),
            last_activity: millis_to_rfc3339(model.last_activity.value()),
            is_private: model.is_private.unwrap_or(false),
        }
    }
}

impl From<User> for http::UserResponseDto {
    fn from(model: User) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            nickname: model.nickname,
            session_id: model.session_id.as_str().to_string(),
        }
    }
}

impl From<ServerStats> for http::StatsResponse {
    fn from(model: ServerStats) -> Self {
        Self {
            total_rooms: model.total_rooms,
            total_users: model.total_users,
            server: http::ServerInfoDto {
                uptime: model.uptime.as_secs_f64(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}
