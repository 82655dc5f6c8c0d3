//! UseCase: キャンバスの全消去

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomName, RoomRepository};

use super::membership::MembershipTracker;

pub struct ClearCanvasUseCase {
    repository: Arc<dyn RoomRepository>,
    membership: Arc<MembershipTracker>,
}

impl ClearCanvasUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, membership: Arc<MembershipTracker>) -> Self {
        Self {
            repository,
            membership,
        }
    }

    /// ルームのストロークを消去し、通知先（送信者を含む全メンバー）を返す
    pub async fn execute(&self, sender: &ConnectionId, room: &RoomName) -> Vec<ConnectionId> {
        self.repository.clear(room).await;

        let mut targets = self.membership.members(room).await;
        if !targets.contains(sender) {
            targets.push(sender.clone());
        }
        tracing::info!("Connection '{}' cleared room '{}'", sender.as_str(), room);
        targets
    }
}
