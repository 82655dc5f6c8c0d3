//! UseCase: ルーム詳細の取得（REST）

use std::sync::Arc;

use crate::domain::{RoomName, RoomRecordStore, RoomRepository, RoomSummary};

use super::{error::GetRoomDetailError, membership::MembershipTracker};

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
    room_store: Arc<dyn RoomRecordStore>,
    membership: Arc<MembershipTracker>,
}

impl GetRoomDetailUseCase {
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

    /// ルームの詳細
    ///
    /// 空のルームは一覧取得でレジストリから消えるため、レジストリに無ければ
    /// 永続レコードから組み立てる（ストローク数は 0）。
    ///
    /// # Returns
    ///
    /// * `Ok(RoomSummary)` - `is_private` は常に設定される（ストア障害時は false）
    /// * `Err(GetRoomDetailError::RoomNotFound)` - レジストリにも永続ストアにも無い
    pub async fn execute(&self, raw_name: &str) -> Result<RoomSummary, GetRoomDetailError> {
        let name = RoomName::new(raw_name).map_err(|_| GetRoomDetailError::InvalidRoomName)?;
        let room = self.repository.find(&name).await;

        let record = match self.room_store.get_room_by_name(&name).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to load room record '{}': {}", name, e);
                None
            }
        };
        let is_private = record.as_ref().is_some_and(|r| r.is_private);

        let (stroke_count, created_at, last_activity) = match (room, record) {
            (Some(room), _) => (room.stroke_count(), room.created_at, room.last_activity),
            (None, Some(record)) => (0, record.created_at, record.last_activity),
            (None, None) => return Err(GetRoomDetailError::RoomNotFound),
        };

        Ok(RoomSummary {
            member_count: self.membership.size(&name).await,
            stroke_count,
            created_at,
            last_activity,
            is_private: Some(is_private),
            name,
        })
    }
}
