//! HTTP API endpoint handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use thiserror::Error;

use crate::{
    domain::{SessionId, StoreError},
    infrastructure::dto::http::{
        CreateRoomRequest, CreateRoomResponse, ErrorResponse, RoomDetailDto, RoomListResponse,
        StatsResponse, UpdateNicknameRequest, UserResponseDto,
    },
    ui::{handler::websocket::fingerprint, state::AppState},
    usecase::{CreateRoomError, GetRoomDetailError, RoomNameRule, UpdateNicknameError},
};

/// Cookie carrying the durable session id
pub const SESSION_COOKIE: &str = "session_id";

/// Error returned by the REST endpoints, rendered as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidSession => ApiError::Unauthorized(e.to_string()),
            // 詳細はログにだけ残す
            _ => ApiError::Internal("internal server error".to_string()),
        }
    }
}

impl From<GetRoomDetailError> for ApiError {
    fn from(e: GetRoomDetailError) -> Self {
        match e {
            GetRoomDetailError::RoomNotFound => ApiError::NotFound(e.to_string()),
            GetRoomDetailError::InvalidRoomName => ApiError::BadRequest(e.to_string()),
        }
    }
}

impl From<CreateRoomError> for ApiError {
    fn from(e: CreateRoomError) -> Self {
        match e {
            CreateRoomError::Validation(_) => ApiError::BadRequest(e.to_string()),
            CreateRoomError::Store(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<UpdateNicknameError> for ApiError {
    fn from(e: UpdateNicknameError) -> Self {
        match e {
            UpdateNicknameError::Validation(_) => ApiError::BadRequest(e.to_string()),
            UpdateNicknameError::InvalidSession => ApiError::Unauthorized(e.to_string()),
            UpdateNicknameError::Store(_) => ApiError::Internal(e.to_string()),
        }
    }
}

fn session_from(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
}

fn session_cookie(session_id: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .permanent()
        .build()
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /api/rooms`
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListResponse> {
    let rooms = state.get_rooms_usecase.execute().await;
    Json(RoomListResponse {
        rooms: rooms.into_iter().map(Into::into).collect(),
    })
}

/// `GET /api/stats`
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(state.get_stats_usecase.execute().await.into())
}

/// `GET /api/rooms/{name}`
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RoomDetailDto>, ApiError> {
    let room = state.get_room_detail_usecase.execute(&name).await?;
    Ok(Json(room.into()))
}

/// `POST /api/rooms`
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let created = state
        .create_room_usecase
        .execute(
            &request.name,
            request.password.as_deref(),
            None,
            RoomNameRule::Strict,
        )
        .await?;
    let response = CreateRoomResponse {
        name: created.name.into_string(),
        is_private: created.is_private,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/user`: resolve or create the user and (re)issue the session cookie
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<UserResponseDto>), ApiError> {
    let user = state
        .get_user_usecase
        .execute(session_from(&jar), &fingerprint(&addr, &headers))
        .await?;
    let jar = jar.add(session_cookie(user.session_id.as_str()));
    Ok((jar, Json(user.into())))
}

/// `PUT /api/user/nickname`
pub async fn update_nickname(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<UpdateNicknameRequest>,
) -> Result<Json<UserResponseDto>, ApiError> {
    let user = state
        .update_nickname_usecase
        .execute(session_from(&jar), &request.nickname)
        .await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;

    #[test]
    fn test_error_status_mapping() {
        // テスト項目: ユースケースのエラーが適切なステータスコードに対応する
        // given (前提条件) / when (操作) / then (期待する結果):
        assert_eq!(
            ApiError::from(GetRoomDetailError::RoomNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CreateRoomError::Validation(ValidationError::EmptyRoomName)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(UpdateNicknameError::InvalidSession).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StoreError::Database("disk full".to_string())).to_string(),
            "internal server error"
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        // テスト項目: セッション Cookie は HttpOnly でサイト全体に有効
        // given (前提条件) / when (操作):
        let cookie = session_cookie("abc");

        // then (期待する結果):
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn test_blank_session_cookie_is_ignored() {
        // テスト項目: 空の session_id Cookie は無いものとして扱う
        // given (前提条件):
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, ""));

        // when (操作) / then (期待する結果):
        assert_eq!(session_from(&jar), None);
        assert_eq!(
            session_from(&CookieJar::new().add(Cookie::new(SESSION_COOKIE, "s1"))),
            Some(SessionId::new("s1"))
        );
    }
}
