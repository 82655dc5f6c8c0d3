//! 接続ごとのセッション状態
//!
//! 1 本の WebSocket 接続が処理中に持ち回る状態です。受信ループが所有し、
//! メッセージは到着順に 1 件ずつ処理されるためロックは不要です。

use crate::domain::{ClientFingerprint, ConnectionId, RoomName, User};

#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub id: ConnectionId,
    /// 現在のルーム（接続直後は `default`）
    pub current_room: Option<RoomName>,
    /// authenticate 済みならそのユーザー
    pub user: Option<User>,
    /// ハンドシェイク時の IP + User-Agent
    pub fingerprint: ClientFingerprint,
}

impl ConnectionSession {
    pub fn new(id: ConnectionId, fingerprint: ClientFingerprint) -> Self {
        Self {
            id,
            current_room: None,
            user: None,
            fingerprint,
        }
    }

    /// 描画系イベントの対象ルーム
    pub fn room(&self) -> RoomName {
        resolve_room(None, self.current_room.as_ref())
    }
}

/// 対象ルームの決定: 明示されたルーム → 現在のルーム → `default`
///
/// 空白だけの名前は指定なしとして扱う。
pub fn resolve_room(explicit: Option<&str>, current: Option<&RoomName>) -> RoomName {
    if let Some(name) = explicit.and_then(|raw| RoomName::new(raw).ok()) {
        return name;
    }
    current.cloned().unwrap_or_else(RoomName::default_room)
}
