//! 永続ストア（外部コラボレーター）の trait 定義
//!
//! ルームレコード・ユーザー・セッションの保存と、パスワードハッシュを扱う。
//! コアはこれらを非同期 CRUD インターフェースとしてのみ利用する。

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::{
    ClientFingerprint, Nickname, RoomName, RoomRecord, SessionId, StoreError, Timestamp, User,
    UserId,
};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoomRecordStore: Send + Sync {
    async fn get_room_by_name(&self, name: &RoomName) -> Result<Option<RoomRecord>, StoreError>;

    /// 作成または更新し、保存後のルームがプライベートかを返す
    ///
    /// `password_hash` があればプライベートルームになる。既存のプライベートルームに
    /// `None` を渡してもパスワードは外れない。
    async fn upsert_room(
        &self,
        name: &RoomName,
        password_hash: Option<String>,
        created_by: Option<UserId>,
    ) -> Result<bool, StoreError>;

    /// パブリック、または未登録のルームなら true
    async fn verify_room_password(
        &self,
        name: &RoomName,
        password: &str,
    ) -> Result<bool, StoreError>;

    /// 最終アクティビティの新しい順
    async fn get_all_rooms(&self) -> Result<Vec<RoomRecord>, StoreError>;

    async fn update_room_activity(&self, name: &RoomName) -> Result<(), StoreError>;

    /// `cutoff` 以前から動きの無いレコードを削除し、件数を返す
    async fn delete_rooms_inactive_since(&self, cutoff: Timestamp) -> Result<u64, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// セッション → フィンガープリント → 新規作成 の順に解決する
    async fn get_or_create_user(
        &self,
        session_id: Option<SessionId>,
        fingerprint: &ClientFingerprint,
    ) -> Result<User, StoreError>;

    async fn update_nickname(
        &self,
        session_id: &SessionId,
        nickname: &Nickname,
    ) -> Result<User, StoreError>;

    /// 期限切れセッションを削除し、件数を返す
    async fn clean_expired_sessions(&self) -> Result<u64, StoreError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, StoreError>;

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, StoreError>;
}
