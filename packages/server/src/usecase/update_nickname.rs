//! UseCase: ニックネームの更新

use std::sync::Arc;

use crate::domain::{Nickname, SessionId, User, UserStore};

use super::error::UpdateNicknameError;

pub struct UpdateNicknameUseCase {
    user_store: Arc<dyn UserStore>,
}

impl UpdateNicknameUseCase {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// ニックネームを検証してから保存する
    pub async fn execute(
        &self,
        session_id: Option<SessionId>,
        raw_nickname: &str,
    ) -> Result<User, UpdateNicknameError> {
        let session_id = session_id.ok_or(UpdateNicknameError::InvalidSession)?;
        let nickname = Nickname::new(raw_nickname)?;

        let user = self
            .user_store
            .update_nickname(&session_id, &nickname)
            .await?;
        tracing::info!("User '{}' is now '{}'", user.id.as_str(), user.nickname);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockUserStore, StoreError, UserId, ValidationError};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_update_nickname_trims_and_saves() {
        // テスト項目: 前後の空白を除いたニックネームが保存される
        // given (前提条件):
        let mut store = MockUserStore::new();
        store
            .expect_update_nickname()
            .with(eq(SessionId::new("s1")), eq(Nickname::new("Боб").unwrap()))
            .times(1)
            .returning(|session_id, nickname| {
                Ok(User {
                    id: UserId::new("u1"),
                    nickname: nickname.as_str().to_string(),
                    session_id: session_id.clone(),
                })
            });
        let usecase = UpdateNicknameUseCase::new(Arc::new(store));

        // when (操作):
        let result = usecase.execute(Some(SessionId::new("s1")), "  Боб  ").await;

        // then (期待する結果):
        assert_eq!(result.unwrap().nickname, "Боб");
    }

    #[tokio::test]
    async fn test_update_nickname_validation_and_session_errors() {
        // テスト項目: 不正なニックネームはストアに渡らず、セッションが無い・切れている場合はエラー
        // given (前提条件):
        let mut store = MockUserStore::new();
        store
            .expect_update_nickname()
            .times(1)
            .returning(|_, _| Err(StoreError::InvalidSession));
        let usecase = UpdateNicknameUseCase::new(Arc::new(store));

        // when (操作):
        let too_short = usecase.execute(Some(SessionId::new("s1")), "x").await;
        let no_session = usecase.execute(None, "Alice").await;
        let expired = usecase.execute(Some(SessionId::new("old")), "Alice").await;

        // then (期待する結果):
        assert!(matches!(
            too_short,
            Err(UpdateNicknameError::Validation(
                ValidationError::NicknameLength { .. }
            ))
        ));
        assert_eq!(no_session, Err(UpdateNicknameError::InvalidSession));
        assert_eq!(expired, Err(UpdateNicknameError::InvalidSession));
    }
}
