//! Repository trait 定義
//!
//! ルームレジストリ（ルーム名 → 描画状態）へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::HashMap;

use async_trait::async_trait;

use super::{
    ConnectionId, NotFoundError, Point, Room, RoomName, RoomSummary, Stroke, StrokeId,
};

/// ルームごとの接続数のスナップショット
pub type MemberCounts = HashMap<RoomName, usize>;

/// Room Repository trait（ルームレジストリ）
///
/// レジストリが描画状態の唯一の正です。各メソッドは 1 回のロック内で完結し、
/// 途中の状態が他の接続から見えることはありません。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得し、無ければ空のルームを作成する（冪等）
    async fn get_or_create(&self, name: &RoomName) -> Room;

    /// ルームを取得する（作成しない）
    async fn find(&self, name: &RoomName) -> Option<Room>;

    /// 全ルームの要約を返す
    ///
    /// 副作用として、メンバー 0 かつストローク 0 のルームを削除する。
    async fn list_active(&self, member_counts: &MemberCounts) -> Vec<RoomSummary>;

    /// ストロークを全消去する（無ければ作成してから消去）
    async fn clear(&self, name: &RoomName);

    /// メンバー 0 かつストローク 0 なら削除し、削除したかを返す
    async fn evict_if_empty(&self, name: &RoomName, member_count: usize) -> bool;

    /// 最終アクティビティを更新する（無ければ作成）
    async fn touch(&self, name: &RoomName);

    /// ストロークを開始する（ルームが無ければ作成）。上限で捨てた件数を返す
    async fn append_stroke_start(&self, name: &RoomName, stroke: Stroke) -> usize;

    /// 既存ストロークに点を追加する
    async fn append_point(
        &self,
        name: &RoomName,
        author: &ConnectionId,
        stroke_id: &StrokeId,
        point: Point,
    ) -> Result<(), NotFoundError>;

    /// ストロークを個別に削除する
    async fn remove_stroke(
        &self,
        name: &RoomName,
        author: &ConnectionId,
        stroke_id: &StrokeId,
    ) -> Result<Stroke, NotFoundError>;

    /// 現在のストローク一覧（ルームが無ければ空）
    async fn snapshot(&self, name: &RoomName) -> Vec<Stroke>;

    /// `evict` が true を返したルームを削除し、削除したルーム名を返す
    async fn evict_where(
        &self,
        evict: &(dyn for<'r> Fn(&'r Room) -> bool + Send + Sync),
    ) -> Vec<RoomName>;

    /// レジストリ内のルーム数
    async fn room_count(&self) -> usize;
}
