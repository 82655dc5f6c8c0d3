//! エンティティ
//!
//! `Room` はルームレジストリだけが所有する。他のコンポーネントは
//! ルーム名（`RoomName`）だけを保持する。

use serde::Serialize;

use super::{
    error::NotFoundError,
    value_object::{ConnectionId, Point, RoomName, SessionId, StrokeId, StrokeStyle, Timestamp, UserId},
};

/// ルームが保持できるストローク数の上限
pub const DEFAULT_MAX_STROKES_PER_ROOM: usize = 5000;
/// 上限到達時に上限からさらに空ける数
pub const DEFAULT_STROKE_RETAIN_MARGIN: usize = 100;

// ========================================
// Stroke
// ========================================

/// 一筆分のストローク
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub author: ConnectionId,
    pub id: StrokeId,
    pub style: StrokeStyle,
    /// 到着順（空間的な順序ではない）
    pub points: Vec<Point>,
    pub created_at: Timestamp,
}

impl Stroke {
    pub fn new(
        author: ConnectionId,
        id: StrokeId,
        style: StrokeStyle,
        first_point: Point,
        created_at: Timestamp,
    ) -> Self {
        Self {
            author,
            id,
            style,
            points: vec![first_point],
            created_at,
        }
    }

    pub fn is_keyed_by(&self, author: &ConnectionId, id: &StrokeId) -> bool {
        &self.author == author && &self.id == id
    }
}

// ========================================
// StrokeCeiling
// ========================================

/// ストローク数の上限ポリシー
///
/// 上限に達したら古いものから捨て、直近 `max_strokes - retain_margin` 件だけ残す。
/// メモリを抑えるための保証であり、捨てたことはクライアントに通知されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeCeiling {
    pub max_strokes: usize,
    pub retain_margin: usize,
}

impl StrokeCeiling {
    pub fn new(max_strokes: usize, retain_margin: usize) -> Self {
        Self {
            max_strokes,
            retain_margin,
        }
    }

    fn retain_count(&self) -> usize {
        self.max_strokes.saturating_sub(self.retain_margin)
    }
}

impl Default for StrokeCeiling {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STROKES_PER_ROOM, DEFAULT_STROKE_RETAIN_MARGIN)
    }
}

// ========================================
// Room
// ========================================

/// ルームの描画状態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub name: RoomName,
    pub strokes: Vec<Stroke>,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}

impl Room {
    pub fn new(name: RoomName, created_at: Timestamp) -> Self {
        Self {
            name,
            strokes: Vec::new(),
            created_at,
            last_activity: created_at,
        }
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.last_activity = now;
    }

    /// メンバーもストロークも無いルームはレジストリに残る理由がない
    pub fn is_evictable(&self, member_count: usize) -> bool {
        member_count == 0 && self.strokes.is_empty()
    }

    /// ストロークを追加し、上限ポリシーで捨てた件数を返す
    ///
    /// 同じキー（作者, ストローク ID）の既存ストロークは置き換える。
    pub fn start_stroke(&mut self, stroke: Stroke, ceiling: StrokeCeiling, now: Timestamp) -> usize {
        self.last_activity = now;

        let mut dropped = 0;
        if self.strokes.len() >= ceiling.max_strokes {
            dropped = self.strokes.len() - ceiling.retain_count().min(self.strokes.len());
            self.strokes.drain(..dropped);
        }

        self.strokes
            .retain(|existing| !existing.is_keyed_by(&stroke.author, &stroke.id));
        self.strokes.push(stroke);
        dropped
    }

    /// キーに一致するストロークへ点を追加する（線形探索）
    pub fn append_point(
        &mut self,
        author: &ConnectionId,
        stroke_id: &StrokeId,
        point: Point,
        now: Timestamp,
    ) -> Result<(), NotFoundError> {
        let stroke = self
            .strokes
            .iter_mut()
            .find(|s| s.is_keyed_by(author, stroke_id))
            .ok_or_else(|| stroke_not_found(&self.name, author, stroke_id))?;
        stroke.points.push(point);
        self.last_activity = now;
        Ok(())
    }

    pub fn remove_stroke(
        &mut self,
        author: &ConnectionId,
        stroke_id: &StrokeId,
    ) -> Result<Stroke, NotFoundError> {
        let index = self
            .strokes
            .iter()
            .position(|s| s.is_keyed_by(author, stroke_id))
            .ok_or_else(|| stroke_not_found(&self.name, author, stroke_id))?;
        Ok(self.strokes.remove(index))
    }

    pub fn clear(&mut self, now: Timestamp) {
        self.strokes.clear();
        self.last_activity = now;
    }
}

fn stroke_not_found(room: &RoomName, author: &ConnectionId, stroke_id: &StrokeId) -> NotFoundError {
    NotFoundError::Stroke {
        room: room.as_str().to_string(),
        author: author.as_str().to_string(),
        stroke_id: stroke_id.as_str().to_string(),
    }
}

/// 一覧表示用のルーム要約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub name: RoomName,
    pub member_count: usize,
    pub stroke_count: usize,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
    /// 永続ストアのレコードから判明した場合のみ設定される
    pub is_private: Option<bool>,
}

// ========================================
// Presence / Identity
// ========================================

/// プレゼンスリストの 1 要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub id: ConnectionId,
    pub name: String,
    pub authenticated: bool,
}

/// 永続ユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    pub session_id: SessionId,
}

/// 永続ストア上のルームレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub name: RoomName,
    pub password_hash: Option<String>,
    pub is_private: bool,
    pub created_by: Option<UserId>,
    pub created_at: Timestamp,
    pub last_activity: Timestamp,
}
