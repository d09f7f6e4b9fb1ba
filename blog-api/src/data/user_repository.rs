use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::token::TokenScope;
use crate::domain::user::User;

#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError>;
    /// Resolves the owner of an unexpired token of `scope`.
    async fn find_for_token(
        &self,
        scope: TokenScope,
        token_hash: &[u8],
    ) -> Result<Option<User>, DomainError>;
    async fn update_user(&self, user: &User) -> Result<User, DomainError>;
}
