//! UseCase: ルーム一覧の取得
//!
//! 人数はメンバーシップトラッカーから都度計算します。一覧の取得には
//! 空のルーム（メンバー 0 かつストローク 0）を削除する副作用があります。

use std::{collections::HashMap, sync::Arc};

use crate::domain::{RoomName, RoomRecordStore, RoomRepository, RoomSummary};

use super::membership::MembershipTracker;

pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    room_store: Arc<dyn RoomRecordStore>,
    membership: Arc<MembershipTracker>,
}

impl GetRoomsUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        room_store: Arc<dyn RoomRecordStore>,
        membership: Arc<MembershipTracker>,
    ) -> Self {
        Self {
            repository,
            room_store,
            membership,
        }
    }

    /// 作成順のルーム一覧
    ///
    /// 永続ストアが使えない場合は `is_private` を付けずに返す。
    pub async fn execute(&self) -> Vec<RoomSummary> {
        let mut rooms = {
            let _rooms = self.membership.lock_rooms().await;
            let member_counts = self.membership.sizes().await;
            self.repository.list_active(&member_counts).await
        };

        match self.room_store.get_all_rooms().await {
            Ok(records) => {
                let privacy: HashMap<RoomName, bool> = records
                    .into_iter()
                    .map(|record| (record.name, record.is_private))
                    .collect();
                for room in &mut rooms {
                    room.is_private = Some(privacy.get(&room.name).copied().unwrap_or(false));
                }
            }
            Err(e) => {
                tracing::warn!("Listing rooms without privacy flags: {}", e);
            }
        }

        rooms
    }
}
