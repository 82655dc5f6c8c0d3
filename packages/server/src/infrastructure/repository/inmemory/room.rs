//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリのルームレジストリとして使用します。
//!
//! ストロークはプロセス再起動をまたいで保持しません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rakugaki_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MemberCounts, NotFoundError, Point, Room, RoomName, RoomRepository, RoomSummary,
    Stroke, StrokeCeiling, StrokeId, Timestamp,
};

/// インメモリ Room Repository 実装
///
/// プロセス起動時に 1 つだけ作り、UseCase と REST ハンドラに `Arc` で渡します。
pub struct InMemoryRoomRepository {
    /// ルーム名 → ルーム
    rooms: Mutex<HashMap<RoomName, Room>>,
    /// ストローク数の上限ポリシー
    ceiling: StrokeCeiling,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    pub fn new(ceiling: StrokeCeiling, clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            ceiling,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

fn entry<'a>(rooms: &'a mut HashMap<RoomName, Room>, name: &RoomName, now: Timestamp) -> &'a mut Room {
    rooms.entry(name.clone()).or_insert_with(|| {
        tracing::info!("Created new room '{}'", name);
        Room::new(name.clone(), now)
    })
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, name: &RoomName) -> Room {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        entry(&mut rooms, name, now).clone()
    }

    async fn find(&self, name: &RoomName) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).cloned()
    }

    async fn list_active(&self, member_counts: &MemberCounts) -> Vec<RoomSummary> {
        let mut rooms = self.rooms.lock().await;
        let count_of = |name: &RoomName| member_counts.get(name).copied().unwrap_or(0);

        let before = rooms.len();
        rooms.retain(|name, room| !room.is_evictable(count_of(name)));
        let evicted = before - rooms.len();
        if evicted > 0 {
            tracing::info!("Evicted {} empty rooms while listing", evicted);
        }

        let mut summaries: Vec<RoomSummary> = rooms
            .values()
            .map(|room| RoomSummary {
                name: room.name.clone(),
                member_count: count_of(&room.name),
                stroke_count: room.stroke_count(),
                created_at: room.created_at,
                last_activity: room.last_activity,
                is_private: None,
            })
            .collect();

        // Sort by creation time for consistent ordering
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        summaries
    }

    async fn clear(&self, name: &RoomName) {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        entry(&mut rooms, name, now).clear(now);
        tracing::info!("Cleared room state '{}'", name);
    }

    async fn evict_if_empty(&self, name: &RoomName, member_count: usize) -> bool {
        let mut rooms = self.rooms.lock().await;
        let evictable = rooms
            .get(name)
            .is_some_and(|room| room.is_evictable(member_count));
        if evictable {
            rooms.remove(name);
            tracing::info!("Evicted empty room '{}'", name);
        }
        evictable
    }

    async fn touch(&self, name: &RoomName) {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        entry(&mut rooms, name, now).touch(now);
    }

    async fn append_stroke_start(&self, name: &RoomName, stroke: Stroke) -> usize {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let dropped = entry(&mut rooms, name, now).start_stroke(stroke, self.ceiling, now);
        if dropped > 0 {
            tracing::warn!(
                "Room '{}' exceeded stroke limit, dropped {} oldest strokes",
                name,
                dropped
            );
        }
        dropped
    }

    async fn append_point(
        &self,
        name: &RoomName,
        author: &ConnectionId,
        stroke_id: &StrokeId,
        point: Point,
    ) -> Result<(), NotFoundError> {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(name)
            .ok_or_else(|| NotFoundError::Room(name.as_str().to_string()))?;
        room.append_point(author, stroke_id, point, now)
    }

    async fn remove_stroke(
        &self,
        name: &RoomName,
        author: &ConnectionId,
        stroke_id: &StrokeId,
    ) -> Result<Stroke, NotFoundError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(name)
            .ok_or_else(|| NotFoundError::Room(name.as_str().to_string()))?;
        room.remove_stroke(author, stroke_id)
    }

    async fn snapshot(&self, name: &RoomName) -> Vec<Stroke> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(name)
            .map(|room| room.strokes.clone())
            .unwrap_or_default()
    }

    async fn evict_where(
        &self,
        evict: &(dyn for<'r> Fn(&'r Room) -> bool + Send + Sync),
    ) -> Vec<RoomName> {
        let mut rooms = self.rooms.lock().await;
        let names: Vec<RoomName> = rooms
            .values()
            .filter(|room| evict(room))
            .map(|room| room.name.clone())
            .collect();
        for name in &names {
            rooms.remove(name);
        }
        names
    }

    async fn room_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrokeStyle;
    use rakugaki_shared::time::ManualClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository のルーム作成・一覧・削除
    // - ストロークの開始・点追加・消去
    //
    // 【なぜこのテストが必要か】
    // - レジストリは描画状態の唯一の正であり、後から参加したユーザーが見る内容を決める
    // - 一覧取得時の削除という副作用が不変条件を守ることを保証する
    //
    // 【どのようなシナリオをテストするか】
    // 1. get_or_create の冪等性
    // 2. list_active による空ルームの削除
    // 3. 存在しないルーム/ストロークへの点追加（NotFound）
    // 4. evict_if_empty / evict_where
    // ========================================

    fn create_test_repository() -> (InMemoryRoomRepository, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let repo = InMemoryRoomRepository::new(StrokeCeiling::default(), clock.clone());
        (repo, clock)
    }

    fn room(name: &str) -> RoomName {
        RoomName::new(name).unwrap()
    }

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn stroke(author: &str, id: &str) -> Stroke {
        Stroke::new(
            conn(author),
            StrokeId::new(id),
            StrokeStyle::lenient(Some("#ff0000".to_string()), Some(3.0)),
            Point::new(10.0, 10.0),
            Timestamp::new(0),
        )
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        // テスト項目: 同じ名前で 2 回呼んでも同じルームが返り、状態はリセットされない
        // given (前提条件):
        let (repo, clock) = create_test_repository();
        let first = repo.get_or_create(&room("alpha")).await;
        repo.append_stroke_start(&room("alpha"), stroke("a", "s1")).await;
        clock.advance(5_000);

        // when (操作):
        let second = repo.get_or_create(&room("alpha")).await;

        // then (期待する結果):
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.stroke_count(), 1);
        assert_eq!(repo.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_list_active_evicts_empty_rooms() {
        // テスト項目: 一覧取得でメンバー 0 かつストローク 0 のルームが削除される
        // given (前提条件):
        let (repo, _clock) = create_test_repository();
        repo.get_or_create(&room("empty")).await;
        repo.get_or_create(&room("occupied")).await;
        repo.append_stroke_start(&room("drawn"), stroke("a", "s1")).await;
        let counts = MemberCounts::from([(room("occupied"), 2)]);

        // when (操作):
        let summaries = repo.list_active(&counts).await;

        // then (期待する結果):
        assert_eq!(summaries.len(), 2);
        assert!(
            summaries
                .iter()
                .all(|s| !(s.member_count == 0 && s.stroke_count == 0))
        );
        assert!(repo.find(&room("empty")).await.is_none());
        let occupied = summaries.iter().find(|s| s.name == room("occupied")).unwrap();
        assert_eq!(occupied.member_count, 2);
        let drawn = summaries.iter().find(|s| s.name == room("drawn")).unwrap();
        assert_eq!(drawn.stroke_count, 1);
    }

    #[tokio::test]
    async fn test_append_point_to_missing_room_or_stroke() {
        // テスト項目: 存在しないルーム・ストロークへの点追加は NotFound になり、ルームを作らない
        // given (前提条件):
        let (repo, _clock) = create_test_repository();
        repo.append_stroke_start(&room("alpha"), stroke("a", "s1")).await;

        // when (操作):
        let missing_room = repo
            .append_point(&room("nowhere"), &conn("a"), &StrokeId::new("s1"), Point::new(1.0, 1.0))
            .await;
        let missing_stroke = repo
            .append_point(&room("alpha"), &conn("b"), &StrokeId::new("s1"), Point::new(1.0, 1.0))
            .await;

        // then (期待する結果):
        assert_eq!(missing_room, Err(NotFoundError::Room("nowhere".to_string())));
        assert!(matches!(missing_stroke, Err(NotFoundError::Stroke { .. })));
        assert!(repo.find(&room("nowhere")).await.is_none());
        assert_eq!(repo.snapshot(&room("alpha")).await[0].points.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_truncates_strokes_only() {
        // テスト項目: clear はストロークだけを消し、ルームは残す
        // given (前提条件):
        let (repo, _clock) = create_test_repository();
        repo.append_stroke_start(&room("alpha"), stroke("a", "s1")).await;
        repo.append_stroke_start(&room("alpha"), stroke("a", "s2")).await;

        // when (操作):
        repo.clear(&room("alpha")).await;

        // then (期待する結果):
        assert!(repo.snapshot(&room("alpha")).await.is_empty());
        assert!(repo.find(&room("alpha")).await.is_some());
    }

    #[tokio::test]
    async fn test_evict_if_empty() {
        // テスト項目: メンバーもストロークも無いときだけ削除される
        // given (前提条件):
        let (repo, _clock) = create_test_repository();
        repo.get_or_create(&room("empty")).await;
        repo.append_stroke_start(&room("drawn"), stroke("a", "s1")).await;

        // when (操作):
        let occupied = repo.evict_if_empty(&room("empty"), 1).await;
        let evicted = repo.evict_if_empty(&room("empty"), 0).await;
        let kept = repo.evict_if_empty(&room("drawn"), 0).await;
        let absent = repo.evict_if_empty(&room("absent"), 0).await;

        // then (期待する結果):
        assert!(!occupied);
        assert!(evicted);
        assert!(!kept);
        assert!(!absent);
        assert_eq!(repo.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_evict_where_removes_matching_rooms() {
        // テスト項目: 条件に一致したルームだけが削除され、その名前が返る
        // given (前提条件):
        let (repo, clock) = create_test_repository();
        repo.get_or_create(&room("old")).await;
        clock.advance(60_000);
        repo.get_or_create(&room("new")).await;

        // when (操作):
        let cutoff = Timestamp::new(30_000);
        let evicted = repo.evict_where(&|r: &Room| r.last_activity < cutoff).await;

        // then (期待する結果):
        assert_eq!(evicted, vec![room("old")]);
        assert!(repo.find(&room("new")).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_stroke() {
        // テスト項目: ストロークを個別に削除できる
        // given (前提条件):
        let (repo, _clock) = create_test_repository();
        repo.append_stroke_start(&room("alpha"), stroke("a", "s1")).await;

        // when (操作):
        let removed = repo
            .remove_stroke(&room("alpha"), &conn("a"), &StrokeId::new("s1"))
            .await;

        // then (期待する結果):
        assert!(removed.is_ok());
        assert!(repo.snapshot(&room("alpha")).await.is_empty());
    }
}
