//! Background jobs that reclaim idle rooms and stale records.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::usecase::ReapRoomsUseCase;

/// How often each job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperSchedule {
    /// 放置ルームの回収間隔
    pub sweep_interval: Duration,
    /// 永続レコード・期限切れセッションの削除間隔
    pub purge_interval: Duration,
}

impl Default for ReaperSchedule {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
            purge_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// Spawn the sweep and purge jobs.
///
/// The first tick of each job fires after one full interval. Abort the
/// returned handles to stop them.
pub fn spawn_reapers(
    reaper: Arc<ReapRoomsUseCase>,
    schedule: ReaperSchedule,
) -> Vec<JoinHandle<()>> {
    let sweeper = reaper.clone();
    let sweep = tokio::spawn(async move {
        let mut ticker = ticker(schedule.sweep_interval);
        loop {
            ticker.tick().await;
            sweeper.sweep_rooms().await;
        }
    });

    let purge = tokio::spawn(async move {
        let mut ticker = ticker(schedule.purge_interval);
        loop {
            ticker.tick().await;
            reaper.purge_records().await;
        }
    });

    tracing::info!(
        "Reaper started (sweep every {:?}, purge every {:?})",
        schedule.sweep_interval,
        schedule.purge_interval
    );
    vec![sweep, purge]
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockRoomRecordStore, MockUserStore, RoomName, StrokeCeiling},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
        usecase::{MembershipTracker, ReaperPolicy},
    };
    use crate::domain::RoomRepository as _;
    use rakugaki_shared::time::ManualClock;

    #[tokio::test]
    async fn test_sweep_job_runs_on_schedule() {
        // テスト項目: sweep ジョブが間隔ごとに実行され、放置ルームが削除される
        // given (前提条件):
        let clock = Arc::new(ManualClock::new(0));
        let repository = Arc::new(InMemoryRoomRepository::new(
            StrokeCeiling::default(),
            clock.clone(),
        ));
        repository
            .get_or_create(&RoomName::new("idle").unwrap())
            .await;
        clock.advance(10 * 60 * 1000);
        let mut store = MockRoomRecordStore::new();
        store.expect_get_all_rooms().returning(|| Ok(vec![]));
        store
            .expect_delete_rooms_inactive_since()
            .returning(|_| Ok(0));
        let mut users = MockUserStore::new();
        users.expect_clean_expired_sessions().returning(|| Ok(0));
        let reaper = Arc::new(ReapRoomsUseCase::new(
            repository.clone(),
            Arc::new(store),
            Arc::new(users),
            Arc::new(MembershipTracker::new(Arc::new(
                WebSocketMessagePusher::new(),
            ))),
            clock,
            ReaperPolicy {
                inactive_timeout: Duration::from_secs(60),
                ..ReaperPolicy::default()
            },
        ));
        let schedule = ReaperSchedule {
            sweep_interval: Duration::from_millis(20),
            purge_interval: Duration::from_millis(20),
        };

        // when (操作):
        let handles = spawn_reapers(reaper, schedule);
        tokio::time::sleep(Duration::from_millis(200)).await;

        // then (期待する結果):
        assert_eq!(repository.room_count().await, 0);
        for handle in handles {
            handle.abort();
        }
    }
}
