use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::token::{Token, TokenScope};

#[async_trait]
pub(crate) trait TokenRepository: Send + Sync {
    async fn insert_token(&self, token: &Token) -> Result<(), DomainError>;
    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64)
    -> Result<u64, DomainError>;
}
