//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ClientFingerprint, ConnectionIdFactory},
    infrastructure::dto::websocket::ClientMessage,
    ui::{
        router::{broadcast_presence, route},
        state::AppState,
    },
    usecase::ConnectionSession,
};

/// IP address and User-Agent of the handshake
pub(crate) fn fingerprint(addr: &SocketAddr, headers: &HeaderMap) -> ClientFingerprint {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    ClientFingerprint::new(addr.ip().to_string(), user_agent)
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let fingerprint = fingerprint(&addr, &headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, fingerprint))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Everything the router addresses to this connection (replies, relays,
/// presence) arrives through `rx`.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, fingerprint: ClientFingerprint) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    // 登録して default ルームに参加
    let room = state
        .connect_participant_usecase
        .execute(connection_id.clone(), tx)
        .await;
    let mut session = ConnectionSession::new(connection_id.clone(), fingerprint);
    session.current_room = Some(room.clone());
    broadcast_presence(&state, &room).await;

    let (sender, mut receiver) = socket.split();
    let state_clone = state.clone();

    // 1 接続のメッセージは到着順に 1 つずつ処理する
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => route(&state_clone, &mut session, message).await,
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring unparseable frame from '{}': {}",
                            session.id.as_str(),
                            e
                        );
                    }
                },
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", session.id.as_str());
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let left = state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
    for room in &left {
        broadcast_presence(&state, room).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_fingerprint_from_handshake() {
        // テスト項目: 接続元 IP と User-Agent からフィンガープリントを作る
        // given (前提条件):
        let addr: SocketAddr = "192.168.0.7:51234".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Firefox/130"));

        // when (操作):
        let with_agent = fingerprint(&addr, &headers);
        let without_agent = fingerprint(&addr, &HeaderMap::new());

        // then (期待する結果):
        assert_eq!(with_agent, ClientFingerprint::new("192.168.0.7", "Firefox/130"));
        assert_eq!(without_agent, ClientFingerprint::new("192.168.0.7", ""));
    }
}
