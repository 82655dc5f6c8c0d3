//! ドメイン層のエラー型

use thiserror::Error;

/// クライアントから渡された値が不正（状態を変更する前に拒否する）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("connection id must not be empty")]
    EmptyConnectionId,

    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("room name must be between {min} and {max} characters")]
    RoomNameLength { min: usize, max: usize },

    #[error("room name may only contain letters, digits, spaces, hyphens and underscores")]
    RoomNameCharacters,

    #[error("nickname must be between {min} and {max} characters")]
    NicknameLength { min: usize, max: usize },

    #[error("nickname may only contain letters, digits, spaces, hyphens and underscores")]
    NicknameCharacters,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("color must be in #RRGGBB form, got '{0}'")]
    InvalidColor(String),

    #[error("brush size must be between {min} and {max}")]
    BrushSize { min: f64, max: f64 },
}

/// 参照されたエンティティが存在しない
///
/// ストローク操作ではエラーとしてクライアントに返さず、黙って無視する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("room '{0}' not found")]
    Room(String),

    #[error("stroke '{stroke_id}' of '{author}' not found in room '{room}'")]
    Stroke {
        room: String,
        author: String,
        stroke_id: String,
    },
}

/// 永続ストアの呼び出しが失敗した
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("session is missing or expired")]
    InvalidSession,
}

/// メッセージ送信（通知）エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("push failed: {0}")]
    PushFailed(String),
}
