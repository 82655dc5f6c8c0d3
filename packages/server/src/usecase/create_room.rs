//! UseCase: ルーム作成
//!
//! 永続ストアにレコードを作成（パスワードがあればハッシュ化）し、
//! 成功した場合にだけレジストリにルームを用意します。

use std::sync::Arc;

use crate::domain::{PasswordHasher, RoomName, RoomRecordStore, RoomRepository, UserId};

use super::error::CreateRoomError;

/// ルーム名の検証レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomNameRule {
    /// 空でなければよい（WebSocket 経路）
    Lenient,
    /// 2〜50 文字、英数字・空白・`-`・`_`（REST 経路）
    Strict,
}

impl RoomNameRule {
    fn apply(self, raw: &str) -> Result<RoomName, CreateRoomError> {
        let name = match self {
            RoomNameRule::Lenient => RoomName::new(raw)?,
            RoomNameRule::Strict => RoomName::validated(raw)?,
        };
        Ok(name)
    }
}

/// 作成結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    pub name: RoomName,
    pub is_private: bool,
}

pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    room_store: Arc<dyn RoomRecordStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CreateRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        room_store: Arc<dyn RoomRecordStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            room_store,
            hasher,
        }
    }

    /// ルームを作成する
    ///
    /// 空のパスワードは指定なしとして扱う。既存のプライベートルームは
    /// プライベートのまま残り、結果にもそれが反映される。
    pub async fn execute(
        &self,
        raw_name: &str,
        password: Option<&str>,
        created_by: Option<UserId>,
        rule: RoomNameRule,
    ) -> Result<CreatedRoom, CreateRoomError> {
        let name = rule.apply(raw_name)?;

        let password_hash = match password.filter(|p| !p.is_empty()) {
            Some(password) => Some(self.hasher.hash(password).await.inspect_err(|e| {
                tracing::error!("Failed to hash password for room '{}': {}", name, e)
            })?),
            None => None,
        };
        let is_private = self
            .room_store
            .upsert_room(&name, password_hash, created_by)
            .await
            .inspect_err(|e| tracing::error!("Failed to store room '{}': {}", name, e))?;

        // ストアが成功してからレジストリに用意する
        self.repository.get_or_create(&name).await;
        tracing::info!("Room '{}' created (private: {})", name, is_private);

        Ok(CreatedRoom { name, is_private })
    }
}
