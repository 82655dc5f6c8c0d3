//! bcrypt によるパスワードハッシュ
//!
//! bcrypt は CPU を占有するため、tokio のブロッキングプールで実行します。

use async_trait::async_trait;

use crate::domain::{PasswordHasher, StoreError};

pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, StoreError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?
            .map_err(|e| StoreError::PasswordHash(e.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, StoreError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?
            .map_err(|e| StoreError::PasswordHash(e.to_string()))
    }
}
