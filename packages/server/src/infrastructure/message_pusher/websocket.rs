//! WebSocket を使った MessagePusher / ConnectionGroups 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理
//! - クライアントへのメッセージ送信（push_to, broadcast）
//! - ルーム名ごとの接続グループ（参加順を保持）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! メンバーシップはこのハブが持ちます。ルームレジストリは人数を保持せず、
//! 必要なときに `group_sizes` を問い合わせます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionGroups, ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomName};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id.clone(), tx).await;
/// pusher.join_group(&connection_id, &RoomName::default_room()).await;
///
/// // クライアントに送信
/// pusher.push_to(&connection_id, "{\"type\":\"clear canvas\"}").await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
    /// ルーム名 → 参加順の接続 ID
    groups: Mutex<HashMap<RoomName, Vec<ConnectionId>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id.as_str());
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(client_id);
        tracing::debug!("Client '{}' unregistered from MessagePusher", client_id.as_str());
    }

    async fn push_to(
        &self,
        client_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(client_id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed message to client '{}'", client_id.as_str());
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(
                client_id.as_str().to_string(),
            ))
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        for target in targets {
            if let Some(sender) = clients.get(&target) {
                // 閉じた接続への送信は無害なので、一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to push message to client '{}': {}",
                        target.as_str(),
                        e
                    );
                } else {
                    tracing::debug!("Broadcasted message to client '{}'", target.as_str());
                }
            } else {
                tracing::debug!(
                    "Client '{}' not found during broadcast, skipping",
                    target.as_str()
                );
            }
        }

        Ok(())
    }

    async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[async_trait]
impl ConnectionGroups for WebSocketMessagePusher {
    async fn join_group(&self, client_id: &ConnectionId, room: &RoomName) {
        let mut groups = self.groups.lock().await;
        let members = groups.entry(room.clone()).or_default();
        if !members.contains(client_id) {
            members.push(client_id.clone());
            tracing::debug!("Client '{}' joined group '{}'", client_id.as_str(), room);
        }
    }

    async fn leave_group(&self, client_id: &ConnectionId, room: &RoomName) -> bool {
        let mut groups = self.groups.lock().await;
        let Some(members) = groups.get_mut(room) else {
            return false;
        };
        let before = members.len();
        members.retain(|id| id != client_id);
        let left = members.len() != before;
        if members.is_empty() {
            groups.remove(room);
        }
        if left {
            tracing::debug!("Client '{}' left group '{}'", client_id.as_str(), room);
        }
        left
    }

    async fn leave_all_groups(&self, client_id: &ConnectionId) -> Vec<RoomName> {
        let mut groups = self.groups.lock().await;
        let mut left = Vec::new();
        for (room, members) in groups.iter_mut() {
            let before = members.len();
            members.retain(|id| id != client_id);
            if members.len() != before {
                left.push(room.clone());
            }
        }
        groups.retain(|_, members| !members.is_empty());
        left.sort();
        left
    }

    async fn group_members(&self, room: &RoomName) -> Vec<ConnectionId> {
        let groups = self.groups.lock().await;
        groups.get(room).cloned().unwrap_or_default()
    }

    async fn group_size(&self, room: &RoomName) -> usize {
        let groups = self.groups.lock().await;
        groups.get(room).map_or(0, Vec::len)
    }

    async fn group_sizes(&self) -> HashMap<RoomName, usize> {
        let groups = self.groups.lock().await;
        groups
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect()
    }
}
