//! ID 生成

use uuid::Uuid;

use super::{ConnectionId, SessionId, UserId};

/// 接続 ID の生成
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        // UUID v4 は空にならない
        ConnectionId::try_from(Uuid::new_v4().to_string())
            .unwrap_or_else(|_| unreachable!("uuid string is never empty"))
    }
}

/// ユーザー・セッション ID の生成
pub struct IdentityFactory;

impl IdentityFactory {
    pub fn user_id() -> UserId {
        UserId::new(Uuid::new_v4().to_string())
    }

    pub fn session_id() -> SessionId {
        SessionId::new(Uuid::new_v4().to_string())
    }

    /// 新規ユーザーの既定ニックネーム（User0〜User9999）
    pub fn default_nickname() -> String {
        format!("User{}", Uuid::new_v4().as_u128() % 10_000)
    }
}
