//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録と `default` ルームへの参加
//!
//! ### なぜこのテストが必要か
//! - 接続直後から描画イベントを受け取れる状態になっていることを保証
//! - `default` ルームがレジストリに存在することを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続
//! - 複数接続：参加順が保持される

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RoomName, RoomRepository};

use super::membership::MembershipTracker;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（ルームレジストリ）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    membership: Arc<MembershipTracker>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        membership: Arc<MembershipTracker>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            membership,
        }
    }

    /// 接続を登録し、`default` ルームに参加させる
    ///
    /// # Returns
    ///
    /// 参加したルーム（プレゼンス通知の対象）
    pub async fn execute(&self, connection_id: ConnectionId, sender: PusherChannel) -> RoomName {
        let room = RoomName::default_room();

        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        {
            let _rooms = self.membership.lock_rooms().await;
            self.membership.join(&connection_id, &room).await;
            self.repository.get_or_create(&room).await;
        }

        tracing::info!(
            "Connection '{}' joined room '{}'",
            connection_id.as_str(),
            room
        );
        room
    }
}
