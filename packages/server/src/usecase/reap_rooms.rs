//! UseCase: 放置されたルームの回収
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReapRoomsUseCase::sweep_rooms(): 誰も居ないまま放置されたルームの削除
//! - ReapRoomsUseCase::purge_records(): 古いルームレコードと期限切れセッションの削除
//!
//! ### なぜこのテストが必要か
//! - 永続レコードのあるルームは長く残し、無いルームは早く回収する
//! - ストア障害時もタスクが止まらず、安全側（長めの猶予）に倒れることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：永続レコードの有無で猶予が変わる
//! - メンバーが居るルームは放置時間に関係なく残る
//! - 異常系：ストア障害時は猶予を 2 倍にする

use std::{collections::HashSet, sync::Arc, time::Duration};

use rakugaki_shared::time::Clock;

use crate::domain::{Room, RoomName, RoomRecordStore, RoomRepository, Timestamp, UserStore};

use super::membership::MembershipTracker;

/// 回収の閾値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperPolicy {
    /// 永続レコードの無いルームの猶予
    pub inactive_timeout: Duration,
    /// 永続レコードのあるルームの猶予
    pub active_timeout: Duration,
    /// 永続レコードを残す期間
    pub record_max_age: Duration,
}

impl Default for ReaperPolicy {
    fn default() -> Self {
        Self {
            inactive_timeout: Duration::from_secs(30 * 60),
            active_timeout: Duration::from_secs(24 * 60 * 60),
            record_max_age: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// purge_records の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeReport {
    pub rooms: u64,
    pub sessions: u64,
}

pub struct ReapRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    room_store: Arc<dyn RoomRecordStore>,
    user_store: Arc<dyn UserStore>,
    membership: Arc<MembershipTracker>,
    clock: Arc<dyn Clock>,
    policy: ReaperPolicy,
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl ReapRoomsUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        room_store: Arc<dyn RoomRecordStore>,
        user_store: Arc<dyn UserStore>,
        membership: Arc<MembershipTracker>,
        clock: Arc<dyn Clock>,
        policy: ReaperPolicy,
    ) -> Self {
        Self {
            repository,
            room_store,
            user_store,
            membership,
            clock,
            policy,
        }
    }

    /// メンバー 0 で猶予を超えて放置されたルームを削除し、その名前を返す
    pub async fn sweep_rooms(&self) -> Vec<RoomName> {
        let durable: Option<HashSet<RoomName>> = match self.room_store.get_all_rooms().await {
            Ok(records) => Some(records.into_iter().map(|r| r.name).collect()),
            Err(e) => {
                tracing::warn!("Room sweep is using the fallback timeout: {}", e);
                None
            }
        };
        let _rooms = self.membership.lock_rooms().await;
        let member_counts = self.membership.sizes().await;
        let now = Timestamp::new(self.clock.now_millis());
        let inactive = millis(self.policy.inactive_timeout);
        let active = millis(self.policy.active_timeout);

        let evict = move |room: &Room| {
            if member_counts.get(&room.name).copied().unwrap_or(0) > 0 {
                return false;
            }
            let limit = match &durable {
                Some(names) if names.contains(&room.name) => active,
                Some(_) => inactive,
                None => inactive.saturating_mul(2),
            };
            now.millis_since(room.last_activity) > limit
        };
        let evicted = self.repository.evict_where(&evict).await;

        if !evicted.is_empty() {
            tracing::info!(
                "Reaped {} idle rooms, {} remain",
                evicted.len(),
                self.repository.room_count().await
            );
        }
        evicted
    }

    /// 古いルームレコードと期限切れセッションを削除する
    pub async fn purge_records(&self) -> PurgeReport {
        let cutoff = Timestamp::new(
            self.clock
                .now_millis()
                .saturating_sub(millis(self.policy.record_max_age)),
        );

        let rooms = self
            .room_store
            .delete_rooms_inactive_since(cutoff)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to purge room records: {}", e);
                0
            });
        let sessions = self
            .user_store
            .clean_expired_sessions()
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to purge expired sessions: {}", e);
                0
            });

        if rooms > 0 || sessions > 0 {
            tracing::info!(
                "Purged {} room records and {} expired sessions",
                rooms,
                sessions
            );
        }
        PurgeReport { rooms, sessions }
    }
}
