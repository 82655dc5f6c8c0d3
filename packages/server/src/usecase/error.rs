//! UseCase 層のエラー型
//!
//! クライアントへ返すメッセージは `Display` をそのまま使います。
//! ストア障害の詳細はログにだけ残し、クライアントには一般的な文言を返します。

use thiserror::Error;

use crate::domain::{StoreError, ValidationError};

/// authenticate のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthenticateError {
    #[error("authentication failed")]
    Store(#[from] StoreError),
}

/// create room のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreateRoomError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("failed to create room")]
    Store(#[from] StoreError),
}

/// join room のエラー（いずれの場合もメンバーシップは変わらない）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinRoomError {
    #[error("invalid password for room '{0}'")]
    Authorization(String),

    #[error("failed to join room")]
    Store(#[from] StoreError),
}

/// ニックネーム更新のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateNicknameError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("session is missing or expired")]
    InvalidSession,

    #[error("failed to update nickname")]
    Store(StoreError),
}

impl From<StoreError> for UpdateNicknameError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidSession => UpdateNicknameError::InvalidSession,
            other => UpdateNicknameError::Store(other),
        }
    }
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,

    #[error("invalid room name")]
    InvalidRoomName,
}
