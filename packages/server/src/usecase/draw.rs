//! UseCase: 描画イベント（draw start / draw continue / draw end）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DrawUseCase の start / append / end
//! - 互換モードと厳格モードの入力検証
//! - 中継先（送信者以外のメンバー）の選定
//!
//! ### なぜこのテストが必要か
//! - 後から参加したユーザーが見るストロークはここで記録される
//! - 送信者自身にイベントが返らないことを保証
//! - 存在しないストロークへの追加が他のストロークを壊さないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：start → continue × N
//! - 座標の欠落（互換モードでは中継のみ、厳格モードでは破棄）
//! - 存在しないストロークへの continue

use std::sync::Arc;

use rakugaki_shared::time::Clock;

use crate::domain::{
    ConnectionId, NotFoundError, Point, RoomName, RoomRepository, Stroke, StrokeId, StrokeStyle,
    Timestamp, ValidationError,
};

use super::membership::MembershipTracker;

/// 描画入力の検証ポリシー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawingPolicy {
    /// true なら `#RRGGBB` と 1〜50 の太さを要求し、不正な入力は中継しない
    pub strict: bool,
}

/// クライアントから届いた描画入力
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawInput {
    pub point: Option<Point>,
    pub color: Option<String>,
    pub size: Option<f64>,
    pub stroke_id: StrokeId,
}

/// 記録されなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// x, y のどちらかが無い
    MissingCoordinates,
    /// 対象のストロークやルームが無い
    NotFound(NotFoundError),
}

/// ストロークストアへの書き込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrokeWrite {
    Created { dropped: usize },
    PointAppended,
    Skipped(SkipReason),
}

/// 描画イベントの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub write: StrokeWrite,
    /// 中継先（送信者以外のメンバー）
    pub relay_to: Vec<ConnectionId>,
}

pub struct DrawUseCase {
    repository: Arc<dyn RoomRepository>,
    membership: Arc<MembershipTracker>,
    clock: Arc<dyn Clock>,
    policy: DrawingPolicy,
}

impl DrawUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        membership: Arc<MembershipTracker>,
        clock: Arc<dyn Clock>,
        policy: DrawingPolicy,
    ) -> Self {
        Self {
            repository,
            membership,
            clock,
            policy,
        }
    }

    /// draw start: 新しいストロークを記録する
    ///
    /// # Errors
    ///
    /// 厳格モードで入力が不正な場合。このとき何も記録せず、中継もしない。
    pub async fn start(
        &self,
        author: &ConnectionId,
        room: &RoomName,
        input: DrawInput,
    ) -> Result<DrawOutcome, ValidationError> {
        let style = if self.policy.strict {
            Self::require_point(&input)?;
            StrokeStyle::strict(input.color, input.size)?
        } else {
            StrokeStyle::lenient(input.color, input.size)
        };

        let write = match input.point {
            Some(point) => {
                let stroke = Stroke::new(
                    author.clone(),
                    input.stroke_id,
                    style,
                    point,
                    Timestamp::new(self.clock.now_millis()),
                );
                let dropped = self.repository.append_stroke_start(room, stroke).await;
                StrokeWrite::Created { dropped }
            }
            None => StrokeWrite::Skipped(SkipReason::MissingCoordinates),
        };

        Ok(self.outcome(author, room, write).await)
    }

    /// draw continue: 既存のストロークに点を追加する
    ///
    /// 対象が無い場合は何もしないが、中継は行う。
    pub async fn append(
        &self,
        author: &ConnectionId,
        room: &RoomName,
        input: DrawInput,
    ) -> Result<DrawOutcome, ValidationError> {
        if self.policy.strict {
            Self::require_point(&input)?;
        }

        let write = match input.point {
            Some(point) => match self
                .repository
                .append_point(room, author, &input.stroke_id, point)
                .await
            {
                Ok(()) => StrokeWrite::PointAppended,
                Err(e) => {
                    tracing::debug!("Ignoring draw continue: {}", e);
                    StrokeWrite::Skipped(SkipReason::NotFound(e))
                }
            },
            None => StrokeWrite::Skipped(SkipReason::MissingCoordinates),
        };

        Ok(self.outcome(author, room, write).await)
    }

    /// draw end: ストロークは残したまま、中継先だけを返す
    pub async fn end(&self, author: &ConnectionId, room: &RoomName) -> Vec<ConnectionId> {
        self.membership.others(room, author).await
    }

    fn require_point(input: &DrawInput) -> Result<(), ValidationError> {
        match input.point {
            Some(_) => Ok(()),
            None => Err(ValidationError::MissingField("x, y")),
        }
    }

    async fn outcome(&self, author: &ConnectionId, room: &RoomName, write: StrokeWrite) -> DrawOutcome {
        DrawOutcome {
            write,
            relay_to: self.membership.others(room, author).await,
        }
    }
}
