//! UseCase: 接続の認証
//!
//! セッション ID（無ければ IP + User-Agent）から永続ユーザーを解決し、
//! 接続に紐づけます。以降のプレゼンスリストではニックネームが使われます。

use std::sync::Arc;

use crate::domain::{ClientFingerprint, ConnectionId, SessionId, User, UserStore};

use super::{error::AuthenticateError, membership::MembershipTracker};

pub struct AuthenticateUseCase {
    user_store: Arc<dyn UserStore>,
    membership: Arc<MembershipTracker>,
}

impl AuthenticateUseCase {
    pub fn new(user_store: Arc<dyn UserStore>, membership: Arc<MembershipTracker>) -> Self {
        Self {
            user_store,
            membership,
        }
    }

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        session_id: Option<SessionId>,
        fingerprint: &ClientFingerprint,
    ) -> Result<User, AuthenticateError> {
        let user = self
            .user_store
            .get_or_create_user(session_id, fingerprint)
            .await
            .inspect_err(|e| tracing::error!("Failed to resolve user: {}", e))?;

        self.membership
            .attach_user(connection_id, user.clone())
            .await;
        tracing::info!(
            "Connection '{}' authenticated as '{}'",
            connection_id.as_str(),
            user.nickname
        );
        Ok(user)
    }
}
