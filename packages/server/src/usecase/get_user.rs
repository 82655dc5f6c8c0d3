//! UseCase: REST からのユーザー解決
//!
//! `session_id` Cookie（無ければ IP + User-Agent）からユーザーを解決し、
//! 見つからなければ新規作成します。

use std::sync::Arc;

use crate::domain::{ClientFingerprint, SessionId, StoreError, User, UserStore};

pub struct GetUserUseCase {
    user_store: Arc<dyn UserStore>,
}

impl GetUserUseCase {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    pub async fn execute(
        &self,
        session_id: Option<SessionId>,
        fingerprint: &ClientFingerprint,
    ) -> Result<User, StoreError> {
        self.user_store
            .get_or_create_user(session_id, fingerprint)
            .await
            .inspect_err(|e| tracing::error!("Failed to resolve user: {}", e))
    }
}
