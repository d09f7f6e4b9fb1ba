use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{ConstraintMap, bounded, classify_db_error};
use crate::data::Page;
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;

const COMMENT_CONSTRAINTS: ConstraintMap = ConstraintMap {
    unique: &[],
    foreign: &[
        ("comments_post_id_fkey", "post"),
        ("comments_user_id_fkey", "user"),
    ],
};

#[derive(Debug, Clone)]
pub(crate) struct PostgresCommentRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresCommentRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    body: String,
    user_id: i64,
    post_id: i64,
    version: i32,
}

#[derive(sqlx::FromRow)]
struct ListedCommentRow {
    total_records: i64,
    #[sqlx(flatten)]
    comment: CommentRow,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            body: row.body,
            user_id: row.user_id,
            post_id: row.post_id,
            version: row.version,
        }
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(
                r#"
                INSERT INTO comments (body, user_id, post_id)
                VALUES ($1, $2, $3)
                RETURNING id, created_at, updated_at, body, user_id, post_id, version
                "#,
            )
            .bind(&input.body)
            .bind(input.user_id)
            .bind(input.post_id)
            .fetch_one(&self.pool),
            map_comment_db_error,
        )
        .await?;

        Ok(row.into())
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(
                r#"
                SELECT id, created_at, updated_at, body, user_id, post_id, version
                FROM comments
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
            map_comment_db_error,
        )
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn list_for_post(
        &self,
        post_id: i64,
        filter: Filter,
    ) -> Result<Page<Comment>, DomainError> {
        let rows = bounded(
            self.query_timeout,
            sqlx::query_as::<_, ListedCommentRow>(
                r#"
                SELECT count(*) OVER() AS total_records,
                       id, created_at, updated_at, body, user_id, post_id, version
                FROM comments
                WHERE post_id = $1
                ORDER BY id ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(post_id)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool),
            map_comment_db_error,
        )
        .await?;

        let Some(total_records) = rows.first().map(|row| row.total_records) else {
            return Ok(Page::empty());
        };
        let items = rows.into_iter().map(|row| row.comment.into()).collect();

        Ok(Page {
            items,
            total_records,
        })
    }

    async fn update_comment(&self, comment: &Comment) -> Result<Comment, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(
                r#"
                UPDATE comments
                SET body = $1,
                    updated_at = NOW(),
                    version = version + 1
                WHERE id = $2 AND user_id = $3 AND post_id = $4 AND version = $5
                RETURNING id, created_at, updated_at, body, user_id, post_id, version
                "#,
            )
            .bind(&comment.body)
            .bind(comment.id)
            .bind(comment.user_id)
            .bind(comment.post_id)
            .bind(comment.version)
            .fetch_optional(&self.pool),
            map_comment_db_error,
        )
        .await?;

        row.map(Comment::from).ok_or(DomainError::EditConflict)
    }

    async fn delete_comment(
        &self,
        comment_id: i64,
        user_id: i64,
        post_id: i64,
    ) -> Result<bool, DomainError> {
        let result = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                DELETE FROM comments
                WHERE id = $1 AND user_id = $2 AND post_id = $3
                "#,
            )
            .bind(comment_id)
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool),
            map_comment_db_error,
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_comment_db_error(err: sqlx::Error) -> DomainError {
    classify_db_error(err, &COMMENT_CONSTRAINTS)
}
