//! UseCase: ルーム状態（スナップショット）の取得
//!
//! `request room state` で使います。ルームが無ければ空のスナップショットを返し、
//! ルームを作成しません。

use std::sync::Arc;

use crate::domain::{RoomName, RoomRepository, Stroke};

use super::session::resolve_room;

pub struct GetRoomStateUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomStateUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 明示されたルーム → 現在のルーム → `default` の順で対象を決め、ストローク一覧を返す
    pub async fn execute(
        &self,
        explicit: Option<&str>,
        current: Option<&RoomName>,
    ) -> (RoomName, Vec<Stroke>) {
        let room = resolve_room(explicit, current);
        let strokes = self.repository.snapshot(&room).await;
        (room, strokes)
    }
}
