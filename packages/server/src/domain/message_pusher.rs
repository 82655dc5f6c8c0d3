//! MessagePusher / ConnectionGroups trait 定義
//!
//! トランスポートが提供する 2 つの機能を抽象化します。
//!
//! - `MessagePusher`: 接続へのメッセージ送信
//! - `ConnectionGroups`: 接続をルーム名のグループに出し入れし、人数やメンバーを問い合わせる

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomName};

/// 接続ごとの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続と送信チャンネルを登録
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// 接続の登録を解除
    async fn unregister_client(&self, client_id: &ConnectionId);

    /// 特定の接続に送信
    async fn push_to(&self, client_id: &ConnectionId, content: &str)
    -> Result<(), MessagePushError>;

    /// 複数の接続に送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 登録中の接続数
    async fn client_count(&self) -> usize;
}

#[async_trait]
pub trait ConnectionGroups: Send + Sync {
    /// グループに追加（既に居れば何もしない）
    async fn join_group(&self, client_id: &ConnectionId, room: &RoomName);

    /// グループから外す。居たかどうかを返す
    async fn leave_group(&self, client_id: &ConnectionId, room: &RoomName) -> bool;

    /// 全グループから外し、外したグループ名を返す
    async fn leave_all_groups(&self, client_id: &ConnectionId) -> Vec<RoomName>;

    /// 参加順のメンバー一覧
    async fn group_members(&self, room: &RoomName) -> Vec<ConnectionId>;

    async fn group_size(&self, room: &RoomName) -> usize;

    /// 全グループの人数
    async fn group_sizes(&self) -> HashMap<RoomName, usize>;
}
