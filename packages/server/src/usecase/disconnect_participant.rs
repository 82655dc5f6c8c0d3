//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 全ルームからの離脱、空ルームの削除、登録解除
//!
//! ### なぜこのテストが必要か
//! - 切断したユーザーがプレゼンスリストに残らないことを保証
//! - 誰も居らず何も描かれていないルームがレジストリに残らないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：最後の参加者の切断（ルーム削除）
//! - ストロークが残っているルームは削除されない
//! - 他の参加者が残っている場合

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomName, RoomRepository};

use super::membership::MembershipTracker;

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    membership: Arc<MembershipTracker>,
}

impl DisconnectParticipantUseCase {
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

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// 離脱したルーム（残ったメンバーへのプレゼンス通知の対象）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Vec<RoomName> {
        let left_rooms = {
            let _rooms = self.membership.lock_rooms().await;

            // 1. メンバーシップから外す
            let left_rooms = self.membership.leave_all(connection_id).await;

            // 2. 空になったルームを削除
            for room in &left_rooms {
                let member_count = self.membership.size(room).await;
                self.repository.evict_if_empty(room, member_count).await;
            }
            left_rooms
        };

        // 3. 登録解除
        self.message_pusher.unregister_client(connection_id).await;
        self.membership.forget(connection_id).await;

        tracing::info!(
            "Connection '{}' disconnected from {:?}",
            connection_id.as_str(),
            left_rooms.iter().map(RoomName::as_str).collect::<Vec<_>>()
        );
        left_rooms
    }
}
