//! UseCase: ルームへの参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 前のルームからの離脱、パスワード検証、スナップショットの取得
//!
//! ### なぜこのテストが必要か
//! - パスワードを間違えた参加がメンバーシップを一切変えないことを保証
//! - ストア障害時に参加を拒否する（プライベートルームを開放しない）ことを確認
//! - 後から参加したユーザーが既存のストロークを受け取れることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：パブリックルームへの参加、正しいパスワードでの参加
//! - 異常系：パスワード不一致、ストア障害
//! - エッジケース：空のルーム名（default）、同じルームへの再参加

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomName, RoomRecordStore, RoomRepository, Stroke};

use super::{error::JoinRoomError, membership::MembershipTracker};

/// 参加結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// 参加したルーム
    pub room: RoomName,
    /// 離脱したルーム（同じルームへの再参加なら None）
    pub previous: Option<RoomName>,
    /// 参加者に送るスナップショット
    pub strokes: Vec<Stroke>,
}

pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    room_store: Arc<dyn RoomRecordStore>,
    membership: Arc<MembershipTracker>,
}

impl JoinRoomUseCase {
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

    /// ルームに参加する
    ///
    /// 空白だけの名前は `default` として扱う。エラー時はメンバーシップを変更しない。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        current_room: Option<&RoomName>,
        requested: Option<&str>,
        password: Option<&str>,
    ) -> Result<JoinOutcome, JoinRoomError> {
        let room = requested
            .and_then(|raw| RoomName::new(raw).ok())
            .unwrap_or_else(RoomName::default_room);

        // 1. パスワード検証（状態を変える前に行う）
        let authorized = self
            .room_store
            .verify_room_password(&room, password.unwrap_or_default())
            .await
            .inspect_err(|e| tracing::error!("Failed to verify password for '{}': {}", room, e))?;
        if !authorized {
            tracing::warn!(
                "Connection '{}' gave a wrong password for room '{}'",
                connection_id.as_str(),
                room
            );
            return Err(JoinRoomError::Authorization(room.into_string()));
        }

        let previous = {
            let _rooms = self.membership.lock_rooms().await;

            // 2. 前のルームから離脱
            let previous = match current_room {
                Some(prev) if prev != &room => {
                    self.membership.leave(connection_id, prev).await;
                    let remaining = self.membership.size(prev).await;
                    self.repository.evict_if_empty(prev, remaining).await;
                    Some(prev.clone())
                }
                _ => None,
            };

            // 3. 新しいルームに参加
            self.membership.join(connection_id, &room).await;
            self.repository.get_or_create(&room).await;
            self.repository.touch(&room).await;
            previous
        };
        if let Err(e) = self.room_store.update_room_activity(&room).await {
            tracing::warn!("Failed to update activity of room '{}': {}", room, e);
        }

        let strokes = self.repository.snapshot(&room).await;
        tracing::info!(
            "Connection '{}' joined room '{}' ({} strokes)",
            connection_id.as_str(),
            room,
            strokes.len()
        );

        Ok(JoinOutcome {
            room,
            previous,
            strokes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockRoomRecordStore, Point, StoreError, StrokeCeiling, StrokeId, StrokeStyle, Timestamp},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };
    use mockall::predicate::{always, eq};
    use rakugaki_shared::time::SystemClock;

    struct Fixture {
        repository: Arc<InMemoryRoomRepository>,
        membership: Arc<MembershipTracker>,
    }

    fn create_fixture() -> Fixture {
        Fixture {
            repository: Arc::new(InMemoryRoomRepository::new(
                StrokeCeiling::default(),
                Arc::new(SystemClock),
            )),
            membership: Arc::new(MembershipTracker::new(Arc::new(
                WebSocketMessagePusher::new(),
            ))),
        }
    }

    fn public_store() -> MockRoomRecordStore {
        let mut store = MockRoomRecordStore::new();
        store
            .expect_verify_room_password()
            .returning(|_, _| Ok(true));
        store.expect_update_room_activity().returning(|_| Ok(()));
        store
    }

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_join_moves_membership_and_returns_snapshot() {
        // テスト項目: 参加すると前のルームから離脱し、新しいルームのスナップショットを受け取る
        // given (前提条件):
        let f = create_fixture();
        let default_room = RoomName::default_room();
        f.membership.join(&id("alice"), &default_room).await;
        f.repository.get_or_create(&default_room).await;
        f.repository
            .append_stroke_start(
                &room("art"),
                Stroke::new(
                    id("bob"),
                    StrokeId::new("s1"),
                    StrokeStyle::default(),
                    Point::new(5.0, 5.0),
                    Timestamp::new(0),
                ),
            )
            .await;
        let usecase =
            JoinRoomUseCase::new(f.repository.clone(), Arc::new(public_store()), f.membership.clone());

        // when (操作):
        let outcome = usecase
            .execute(&id("alice"), Some(&default_room), Some("art"), None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome.room, room("art"));
        assert_eq!(outcome.previous, Some(default_room.clone()));
        assert_eq!(outcome.strokes.len(), 1);
        assert_eq!(f.membership.members(&room("art")).await, vec![id("alice")]);
        assert_eq!(f.membership.size(&default_room).await, 0);
        // 空になった default は削除される
        assert!(f.repository.find(&default_room).await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_password_leaves_membership_unchanged() {
        // テスト項目: パスワード不一致ではメンバーシップが変わらず、AuthorizationError になる
        // given (前提条件):
        let f = create_fixture();
        let default_room = RoomName::default_room();
        f.membership.join(&id("alice"), &default_room).await;
        let mut store = MockRoomRecordStore::new();
        store
            .expect_verify_room_password()
            .with(eq(room("vault")), eq("wrong"))
            .times(1)
            .returning(|_, _| Ok(false));
        store.expect_update_room_activity().never();
        let usecase = JoinRoomUseCase::new(f.repository.clone(), Arc::new(store), f.membership.clone());

        // when (操作):
        let result = usecase
            .execute(&id("alice"), Some(&default_room), Some("vault"), Some("wrong"))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(JoinRoomError::Authorization("vault".to_string())));
        assert_eq!(f.membership.members(&default_room).await, vec![id("alice")]);
        assert_eq!(f.membership.size(&room("vault")).await, 0);
        assert!(f.repository.find(&room("vault")).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_refuses_join() {
        // テスト項目: パスワード検証でストアが失敗したら参加を拒否する
        // given (前提条件):
        let f = create_fixture();
        let mut store = MockRoomRecordStore::new();
        store
            .expect_verify_room_password()
            .with(always(), always())
            .returning(|_, _| Err(StoreError::Database("unavailable".to_string())));
        let usecase = JoinRoomUseCase::new(f.repository.clone(), Arc::new(store), f.membership.clone());

        // when (操作):
        let result = usecase.execute(&id("alice"), None, Some("vault"), None).await;

        // then (期待する結果):
        assert!(matches!(result, Err(JoinRoomError::Store(_))));
        assert_eq!(f.membership.size(&room("vault")).await, 0);
    }

    #[tokio::test]
    async fn test_blank_name_joins_default_and_rejoin_keeps_membership() {
        // テスト項目: 空白の名前は default になり、同じルームへの再参加では離脱しない
        // given (前提条件):
        let f = create_fixture();
        let usecase =
            JoinRoomUseCase::new(f.repository.clone(), Arc::new(public_store()), f.membership.clone());
        let first = usecase
            .execute(&id("alice"), None, Some("   "), None)
            .await
            .unwrap();

        // when (操作):
        let again = usecase
            .execute(&id("alice"), Some(&first.room), None, None)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(first.room, RoomName::default_room());
        assert_eq!(again.previous, None);
        assert_eq!(f.membership.size(&RoomName::default_room()).await, 1);
    }

    #[tokio::test]
    async fn test_activity_update_failure_is_tolerated() {
        // テスト項目: 最終アクティビティの更新に失敗しても参加は成功する
        // given (前提条件):
        let f = create_fixture();
        let mut store = MockRoomRecordStore::new();
        store
            .expect_verify_room_password()
            .returning(|_, _| Ok(true));
        store
            .expect_update_room_activity()
            .returning(|_| Err(StoreError::Database("read-only".to_string())));
        let usecase = JoinRoomUseCase::new(f.repository.clone(), Arc::new(store), f.membership.clone());

        // when (操作):
        let result = usecase.execute(&id("alice"), None, Some("art"), None).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(f.membership.size(&room("art")).await, 1);
    }
}
