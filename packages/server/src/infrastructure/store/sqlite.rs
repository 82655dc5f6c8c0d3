//! SQLite を使った永続ストア実装
//!
//! ルームレコード（パスワードハッシュ付き）・ユーザー・セッションを保存します。
//! 時刻はすべて Unix ミリ秒の INTEGER で保持します。

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use rakugaki_shared::time::Clock;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{
    ClientFingerprint, IdentityFactory, Nickname, PasswordHasher, RoomName, RoomRecord,
    RoomRecordStore, SessionId, StoreError, Timestamp, User, UserId, UserStore,
};

/// セッションの既定の有効期間（30 日）
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        nickname TEXT NOT NULL,
        ip_address TEXT NOT NULL DEFAULT '',
        user_agent TEXT NOT NULL DEFAULT '',
        created_at INTEGER NOT NULL,
        last_seen INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS rooms (
        name TEXT PRIMARY KEY,
        password_hash TEXT,
        is_private INTEGER NOT NULL DEFAULT 0,
        created_by TEXT REFERENCES users (id),
        created_at INTEGER NOT NULL,
        last_activity INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_sessions (
        session_id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users (id),
        ip_address TEXT NOT NULL DEFAULT '',
        user_agent TEXT NOT NULL DEFAULT '',
        expires_at INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )",
];

type RoomRow = (String, Option<String>, i64, Option<String>, i64, i64);

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// SQLite 永続ストア
pub struct SqliteStore {
    pool: SqlitePool,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
}

impl SqliteStore {
    /// データベースに接続し、スキーマを作成する
    ///
    /// `sqlite::memory:` の場合は接続を 1 本に固定する（接続ごとに別の DB になるため）。
    pub async fn connect(
        database_url: &str,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
        session_ttl: Duration,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        let store = Self {
            pool,
            hasher,
            clock,
            session_ttl,
        };
        store.initialize().await?;
        tracing::info!("Connected to database '{}'", database_url);
        Ok(store)
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    fn session_expiry(&self) -> i64 {
        self.now() + self.session_ttl.as_millis() as i64
    }

    async fn create_session(
        &self,
        user_id: &UserId,
        fingerprint: &ClientFingerprint,
    ) -> Result<SessionId, StoreError> {
        let session_id = IdentityFactory::session_id();
        sqlx::query(
            "INSERT INTO user_sessions (session_id, user_id, ip_address, user_agent, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session_id.as_str())
        .bind(user_id.as_str())
        .bind(&fingerprint.ip_address)
        .bind(&fingerprint.user_agent)
        .bind(self.session_expiry())
        .bind(self.now())
        .execute(&self.pool)
        .await?;
        Ok(session_id)
    }

    /// 有効なセッションのユーザー ID とニックネーム
    async fn find_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<(String, String)>, StoreError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT us.user_id, u.nickname
             FROM user_sessions us
             JOIN users u ON us.user_id = u.id
             WHERE us.session_id = ? AND us.expires_at > ?",
        )
        .bind(session_id.as_str())
        .bind(self.now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn touch_user(
        &self,
        user_id: &str,
        fingerprint: &ClientFingerprint,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET ip_address = ?, user_agent = ?, last_seen = ? WHERE id = ?")
            .bind(&fingerprint.ip_address)
            .bind(&fingerprint.user_agent)
            .bind(self.now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user(&self, fingerprint: &ClientFingerprint) -> Result<User, StoreError> {
        let user_id = IdentityFactory::user_id();
        let nickname = IdentityFactory::default_nickname();
        let now = self.now();
        sqlx::query(
            "INSERT INTO users (id, nickname, ip_address, user_agent, created_at, last_seen)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id.as_str())
        .bind(&nickname)
        .bind(&fingerprint.ip_address)
        .bind(&fingerprint.user_agent)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let session_id = self.create_session(&user_id, fingerprint).await?;
        tracing::info!("Created new user '{}' ({})", nickname, user_id.as_str());
        Ok(User {
            id: user_id,
            nickname,
            session_id,
        })
    }
}

fn room_record(row: RoomRow) -> Result<RoomRecord, StoreError> {
    let (name, password_hash, is_private, created_by, created_at, last_activity) = row;
    let name = RoomName::new(&name)
        .map_err(|e| StoreError::Database(format!("invalid room name in store: {}", e)))?;
    Ok(RoomRecord {
        name,
        password_hash,
        is_private: is_private != 0,
        created_by: created_by.map(UserId::new),
        created_at: Timestamp::new(created_at),
        last_activity: Timestamp::new(last_activity),
    })
}

#[async_trait]
impl RoomRecordStore for SqliteStore {
    async fn get_room_by_name(&self, name: &RoomName) -> Result<Option<RoomRecord>, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT name, password_hash, is_private, created_by, created_at, last_activity
             FROM rooms WHERE name = ?",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(room_record).transpose()
    }

    async fn upsert_room(
        &self,
        name: &RoomName,
        password_hash: Option<String>,
        created_by: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let now = self.now();
        let requested_private = password_hash.is_some();
        // パスワード無しの upsert ではプライベートルームを公開に戻さない
        let is_private = sqlx::query_scalar::<_, i64>(
            "INSERT INTO rooms (name, password_hash, is_private, created_by, created_at, last_activity)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                 password_hash = COALESCE(excluded.password_hash, rooms.password_hash),
                 is_private = COALESCE(excluded.password_hash, rooms.password_hash) IS NOT NULL,
                 last_activity = excluded.last_activity
             RETURNING is_private",
        )
        .bind(name.as_str())
        .bind(password_hash)
        .bind(requested_private as i64)
        .bind(created_by.as_ref().map(UserId::as_str))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?
            != 0;
        if is_private && !requested_private {
            tracing::info!("Room '{}' stays private; upsert without password ignored", name);
        }
        tracing::debug!("Upserted room record '{}' (private: {})", name, is_private);
        Ok(is_private)
    }

    async fn verify_room_password(
        &self,
        name: &RoomName,
        password: &str,
    ) -> Result<bool, StoreError> {
        match self.get_room_by_name(name).await? {
            Some(RoomRecord {
                password_hash: Some(hash),
                ..
            }) => self.hasher.verify(password, &hash).await,
            _ => Ok(true),
        }
    }

    async fn get_all_rooms(&self) -> Result<Vec<RoomRecord>, StoreError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            "SELECT name, password_hash, is_private, created_by, created_at, last_activity
             FROM rooms ORDER BY last_activity DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(room_record).collect()
    }

    async fn update_room_activity(&self, name: &RoomName) -> Result<(), StoreError> {
        sqlx::query("UPDATE rooms SET last_activity = ? WHERE name = ?")
            .bind(self.now())
            .bind(name.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_rooms_inactive_since(&self, cutoff: Timestamp) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM rooms WHERE last_activity <= ?")
            .bind(cutoff.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn get_or_create_user(
        &self,
        session_id: Option<SessionId>,
        fingerprint: &ClientFingerprint,
    ) -> Result<User, StoreError> {
        // 1. 有効なセッション
        if let Some(session_id) = session_id
            && let Some((user_id, nickname)) = self.find_session(&session_id).await?
        {
            self.touch_user(&user_id, fingerprint).await?;
            return Ok(User {
                id: UserId::new(user_id),
                nickname,
                session_id,
            });
        }

        // 2. 同じ IP + User-Agent の既存ユーザーに新しいセッションを発行
        let existing = sqlx::query_as::<_, (String, String)>(
            "SELECT id, nickname FROM users
             WHERE ip_address = ? AND user_agent = ?
             ORDER BY last_seen DESC LIMIT 1",
        )
        .bind(&fingerprint.ip_address)
        .bind(&fingerprint.user_agent)
        .fetch_optional(&self.pool)
        .await?;
        if let Some((user_id, nickname)) = existing {
            let user_id = UserId::new(user_id);
            let session_id = self.create_session(&user_id, fingerprint).await?;
            self.touch_user(user_id.as_str(), fingerprint).await?;
            return Ok(User {
                id: user_id,
                nickname,
                session_id,
            });
        }

        // 3. 新規ユーザー
        self.create_user(fingerprint).await
    }

    async fn update_nickname(
        &self,
        session_id: &SessionId,
        nickname: &Nickname,
    ) -> Result<User, StoreError> {
        let (user_id, _) = self
            .find_session(session_id)
            .await?
            .ok_or(StoreError::InvalidSession)?;
        sqlx::query("UPDATE users SET nickname = ?, last_seen = ? WHERE id = ?")
            .bind(nickname.as_str())
            .bind(self.now())
            .bind(&user_id)
            .execute(&self.pool)
            .await?;
        Ok(User {
            id: UserId::new(user_id),
            nickname: nickname.as_str().to_string(),
            session_id: session_id.clone(),
        })
    }

    async fn clean_expired_sessions(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= ?")
            .bind(self.now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
