//! UseCase: サーバー統計（REST）
//!
//! レジストリのルーム数、接続数、プロセスの稼働時間を返します。

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::domain::{MessagePusher, RoomRepository};

/// サーバー統計
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStats {
    /// レジストリ上のルーム数
    pub total_rooms: usize,
    /// 接続中の WebSocket 数
    pub total_users: usize,
    pub uptime: Duration,
}

pub struct GetStatsUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    started_at: Instant,
}

impl GetStatsUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        started_at: Instant,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            started_at,
        }
    }

    pub async fn execute(&self) -> ServerStats {
        ServerStats {
            total_rooms: self.repository.room_count().await,
            total_users: self.message_pusher.client_count().await,
            uptime: self.started_at.elapsed(),
        }
    }
}
