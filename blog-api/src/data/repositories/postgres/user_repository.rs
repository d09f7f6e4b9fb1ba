use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{ConstraintMap, bounded, classify_db_error};
use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::token::TokenScope;
use crate::domain::user::User;

const USER_CONSTRAINTS: ConstraintMap = ConstraintMap {
    unique: &[("users_email_key", "email"), ("users_username_key", "username")],
    foreign: &[],
};

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    created_at: DateTime<Utc>,
    username: String,
    email: String,
    activated: bool,
    version: i32,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    password_hash: String,
    #[sqlx(flatten)]
    user: UserRow,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            username: row.username,
            email: row.email,
            activated: row.activated,
            version: row.version,
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(
                r#"
                INSERT INTO users (username, email, password_hash)
                VALUES ($1, $2, $3)
                RETURNING id, created_at, username, email, activated, version
                "#,
            )
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .fetch_one(&self.pool),
            map_user_db_error,
        )
        .await?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserCredentialsRow>(
                r#"
                SELECT id, created_at, username, email, activated, version, password_hash
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
            map_user_db_error,
        )
        .await?;

        Ok(row.map(|r| UserCredentials {
            user: r.user.into(),
            password_hash: r.password_hash,
        }))
    }

    async fn find_for_token(
        &self,
        scope: TokenScope,
        token_hash: &[u8],
    ) -> Result<Option<User>, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT users.id, users.created_at, users.username, users.email,
                       users.activated, users.version
                FROM users
                INNER JOIN tokens ON tokens.user_id = users.id
                WHERE tokens.hash = $1
                  AND tokens.scope = $2
                  AND tokens.expiry > NOW()
                "#,
            )
            .bind(token_hash)
            .bind(scope.as_str())
            .fetch_optional(&self.pool),
            map_user_db_error,
        )
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_user(&self, user: &User) -> Result<User, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(
                r#"
                UPDATE users
                SET username = $1,
                    email = $2,
                    activated = $3,
                    version = version + 1
                WHERE id = $4 AND version = $5
                RETURNING id, created_at, username, email, activated, version
                "#,
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.activated)
            .bind(user.id)
            .bind(user.version)
            .fetch_optional(&self.pool),
            map_user_db_error,
        )
        .await?;

        row.map(User::from).ok_or(DomainError::EditConflict)
    }
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    classify_db_error(err, &USER_CONSTRAINTS)
}
