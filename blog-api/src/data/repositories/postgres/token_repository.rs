use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ConstraintMap, bounded, classify_db_error};
use crate::data::token_repository::TokenRepository;
use crate::domain::error::DomainError;
use crate::domain::token::{Token, TokenScope};

const TOKEN_CONSTRAINTS: ConstraintMap = ConstraintMap {
    unique: &[],
    foreign: &[("tokens_user_id_fkey", "user")],
};

#[derive(Debug, Clone)]
pub(crate) struct PostgresTokenRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresTokenRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn insert_token(&self, token: &Token) -> Result<(), DomainError> {
        bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO tokens (hash, user_id, expiry, scope)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&token.hash)
            .bind(token.user_id)
            .bind(token.expiry)
            .bind(token.scope.as_str())
            .execute(&self.pool),
            map_token_db_error,
        )
        .await?;

        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        scope: TokenScope,
        user_id: i64,
    ) -> Result<u64, DomainError> {
        let result = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                DELETE FROM tokens
                WHERE scope = $1 AND user_id = $2
                "#,
            )
            .bind(scope.as_str())
            .bind(user_id)
            .execute(&self.pool),
            map_token_db_error,
        )
        .await?;

        Ok(result.rows_affected())
    }
}

fn map_token_db_error(err: sqlx::Error) -> DomainError {
    classify_db_error(err, &TOKEN_CONSTRAINTS)
}
