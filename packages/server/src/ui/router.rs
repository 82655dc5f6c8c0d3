//! Event router: dispatches one parsed client message.
//!
//! The router turns each [`ClientMessage`] into a use case call, converts the
//! result into [`ServerMessage`]s and pushes them to the sender, the other
//! members of the room, or everyone in it.
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - route() によるイベントごとの送信先（送信者のみ / 送信者以外 / 全員）
//! - join room のパスワードフローとプレゼンス通知
//!
//! ### なぜこのテストが必要か
//! - 描画イベントが送信者に返らないこと、clear canvas は送信者にも届くことを保証
//! - パスワード不一致で `room joined` が送られないことを確認
//!
//! ### どのような状況を想定しているか
//! - 2〜3 接続が同じルームに居る状態での描画・消去
//! - 後から参加した接続がスナップショットを受け取る
//! - プライベートルームへの正しい / 誤ったパスワードでの参加

use crate::{
    domain::{ConnectionId, Point, RoomName, SessionId},
    infrastructure::dto::{
        conversion::stroke_id_from,
        websocket::{ClientMessage, DrawEndPayload, DrawPayload, ServerMessage},
    },
    ui::state::AppState,
    usecase::{ConnectionSession, DrawInput, RoomNameRule},
};

/// Handle one message from `session`, in arrival order.
pub async fn route(state: &AppState, session: &mut ConnectionSession, message: ClientMessage) {
    tracing::debug!(
        "Connection '{}' sent '{}'",
        session.id.as_str(),
        message.kind()
    );

    match message {
        ClientMessage::Authenticate { session_id } => {
            authenticate(state, session, session_id).await
        }
        ClientMessage::CreateRoom { room, password } => {
            create_room(state, session, room, password).await
        }
        ClientMessage::JoinRoom { room, password } => {
            join_room(state, session, room, password).await
        }
        ClientMessage::RequestRoomState { room } => {
            let (_, strokes) = state
                .get_room_state_usecase
                .execute(room.as_deref(), session.current_room.as_ref())
                .await;
            let reply = ServerMessage::RoomState {
                strokes: strokes.into_iter().map(Into::into).collect(),
            };
            send_to(state, &session.id, &reply).await;
        }
        ClientMessage::GetRooms {} => {
            let rooms = state.get_rooms_usecase.execute().await;
            let reply = ServerMessage::RoomsList {
                rooms: rooms.into_iter().map(Into::into).collect(),
            };
            send_to(state, &session.id, &reply).await;
        }
        ClientMessage::DrawStart(payload) => draw_start(state, session, payload).await,
        ClientMessage::DrawContinue(payload) => draw_continue(state, session, payload).await,
        ClientMessage::DrawEnd(payload) => draw_end(state, session, payload).await,
        ClientMessage::ClearCanvas {} => {
            let targets = state
                .clear_canvas_usecase
                .execute(&session.id, &session.room())
                .await;
            broadcast(state, targets, &ServerMessage::ClearCanvas {}).await;
        }
    }
}

/// Send the presence list of `room` to every member of it.
pub async fn broadcast_presence(state: &AppState, room: &RoomName) {
    let users = state.membership.presence(room).await;
    let targets = users.iter().map(|entry| entry.id.clone()).collect();
    let message = ServerMessage::UsersListUpdate {
        users: users.into_iter().map(Into::into).collect(),
    };
    broadcast(state, targets, &message).await;
}

async fn authenticate(state: &AppState, session: &mut ConnectionSession, session_id: Option<String>) {
    let session_id = session_id.filter(|s| !s.is_empty()).map(SessionId::new);
    match state
        .authenticate_usecase
        .execute(&session.id, session_id, &session.fingerprint)
        .await
    {
        Ok(user) => {
            session.user = Some(user.clone());
            let reply = ServerMessage::Authenticated { user: user.into() };
            send_to(state, &session.id, &reply).await;
            // 合成名をニックネームに置き換える
            broadcast_presence(state, &session.room()).await;
        }
        Err(e) => {
            let reply = ServerMessage::AuthenticationError {
                error: e.to_string(),
            };
            send_to(state, &session.id, &reply).await;
        }
    }
}

async fn create_room(
    state: &AppState,
    session: &ConnectionSession,
    room: Option<String>,
    password: Option<String>,
) {
    let created_by = session.user.as_ref().map(|user| user.id.clone());
    let reply = match state
        .create_room_usecase
        .execute(
            room.as_deref().unwrap_or_default(),
            password.as_deref(),
            created_by,
            RoomNameRule::Lenient,
        )
        .await
    {
        Ok(created) => ServerMessage::RoomCreated {
            room: created.name.into_string(),
            is_private: created.is_private,
        },
        Err(e) => {
            tracing::warn!(
                "Connection '{}' could not create a room: {}",
                session.id.as_str(),
                e
            );
            ServerMessage::RoomCreationError {
                error: e.to_string(),
            }
        }
    };
    send_to(state, &session.id, &reply).await;
}

async fn join_room(
    state: &AppState,
    session: &mut ConnectionSession,
    room: Option<String>,
    password: Option<String>,
) {
    let outcome = match state
        .join_room_usecase
        .execute(
            &session.id,
            session.current_room.as_ref(),
            room.as_deref(),
            password.as_deref(),
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            let reply = ServerMessage::JoinRoomError {
                error: e.to_string(),
            };
            send_to(state, &session.id, &reply).await;
            return;
        }
    };

    session.current_room = Some(outcome.room.clone());

    let joined = ServerMessage::RoomJoined {
        room: outcome.room.as_str().to_string(),
    };
    send_to(state, &session.id, &joined).await;
    let snapshot = ServerMessage::RoomState {
        strokes: outcome.strokes.into_iter().map(Into::into).collect(),
    };
    send_to(state, &session.id, &snapshot).await;

    broadcast_presence(state, &outcome.room).await;
    if let Some(previous) = &outcome.previous {
        broadcast_presence(state, previous).await;
    }
}

fn draw_input(payload: &DrawPayload) -> DrawInput {
    let point = match (payload.x, payload.y) {
        (Some(x), Some(y)) => Some(Point::new(x, y)),
        _ => None,
    };
    DrawInput {
        point,
        color: payload.color.clone(),
        size: payload.size,
        stroke_id: stroke_id_from(payload.stroke_id.as_ref()),
    }
}

async fn draw_start(state: &AppState, session: &ConnectionSession, payload: DrawPayload) {
    let outcome = state
        .draw_usecase
        .start(&session.id, &session.room(), draw_input(&payload))
        .await;
    match outcome {
        Ok(outcome) => {
            let relay = ServerMessage::DrawStart {
                data: payload,
                user_id: session.id.as_str().to_string(),
            };
            broadcast(state, outcome.relay_to, &relay).await;
        }
        Err(e) => tracing::warn!(
            "Dropping draw start from '{}': {}",
            session.id.as_str(),
            e
        ),
    }
}

async fn draw_continue(state: &AppState, session: &ConnectionSession, payload: DrawPayload) {
    let outcome = state
        .draw_usecase
        .append(&session.id, &session.room(), draw_input(&payload))
        .await;
    match outcome {
        Ok(outcome) => {
            let relay = ServerMessage::DrawContinue {
                data: payload,
                user_id: session.id.as_str().to_string(),
            };
            broadcast(state, outcome.relay_to, &relay).await;
        }
        Err(e) => tracing::warn!(
            "Dropping draw continue from '{}': {}",
            session.id.as_str(),
            e
        ),
    }
}

async fn draw_end(state: &AppState, session: &ConnectionSession, payload: DrawEndPayload) {
    let targets = state.draw_usecase.end(&session.id, &session.room()).await;
    let relay = ServerMessage::DrawEnd {
        data: payload,
        user_id: session.id.as_str().to_string(),
    };
    broadcast(state, targets, &relay).await;
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .inspect_err(|e| tracing::error!("Failed to serialize outbound message: {}", e))
        .ok()
}

async fn send_to(state: &AppState, target: &ConnectionId, message: &ServerMessage) {
    let Some(json) = encode(message) else {
        return;
    };
    if let Err(e) = state.message_pusher.push_to(target, &json).await {
        tracing::warn!("Failed to reply to '{}': {}", target.as_str(), e);
    }
}

async fn broadcast(state: &AppState, targets: Vec<ConnectionId>, message: &ServerMessage) {
    if targets.is_empty() {
        return;
    }
    let Some(json) = encode(message) else {
        return;
    };
    if let Err(e) = state.message_pusher.broadcast(targets, &json).await {
        tracing::warn!("Failed to broadcast: {}", e);
    }
}
