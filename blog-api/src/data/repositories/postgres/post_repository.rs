use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{ConstraintMap, bounded, classify_db_error};
use crate::data::Page;
use crate::data::post_repository::{NewPost, PostRepository, PostSearch};
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;
use crate::domain::post::Post;

const POST_CONSTRAINTS: ConstraintMap = ConstraintMap {
    unique: &[("posts_slug_key", "slug")],
    foreign: &[],
};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    title: String,
    subtitle: String,
    content: String,
    tags: Vec<String>,
    claps: i64,
    status: String,
    published_at: Option<DateTime<Utc>>,
    version: i32,
    slug: String,
}

#[derive(sqlx::FromRow)]
struct ListedPostRow {
    total_records: i64,
    #[sqlx(flatten)]
    post: PostRow,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                INSERT INTO posts (title, subtitle, content, tags, slug)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, created_at, updated_at, title, subtitle, content, tags,
                          claps, status, published_at, version, slug
                "#,
            )
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.content)
            .bind(&input.tags)
            .bind(&input.slug)
            .fetch_one(&self.pool),
            map_post_db_error,
        )
        .await?;

        map_row_to_post(row)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                SELECT id, created_at, updated_at, title, subtitle, content, tags,
                       claps, status, published_at, version, slug
                FROM posts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
            map_post_db_error,
        )
        .await?;

        row.map(map_row_to_post).transpose()
    }

    async fn update_post(&self, post: &Post) -> Result<Post, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                UPDATE posts
                SET title = $1,
                    subtitle = $2,
                    content = $3,
                    tags = $4,
                    slug = $5,
                    version = version + 1,
                    updated_at = NOW()
                WHERE id = $6 AND version = $7
                RETURNING id, created_at, updated_at, title, subtitle, content, tags,
                          claps, status, published_at, version, slug
                "#,
            )
            .bind(&post.title)
            .bind(&post.subtitle)
            .bind(&post.content)
            .bind(&post.tags)
            .bind(&post.slug)
            .bind(post.id)
            .bind(post.version)
            .fetch_optional(&self.pool),
            map_post_db_error,
        )
        .await?;

        row.map(map_row_to_post)
            .transpose()?
            .ok_or(DomainError::EditConflict)
    }

    async fn publish_post(&self, id: i64, expected_version: i32) -> Result<Post, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                UPDATE posts
                SET status = 'published',
                    published_at = NOW(),
                    updated_at = NOW(),
                    version = version + 1
                WHERE id = $1 AND version = $2
                RETURNING id, created_at, updated_at, title, subtitle, content, tags,
                          claps, status, published_at, version, slug
                "#,
            )
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool),
            map_post_db_error,
        )
        .await?;

        row.map(map_row_to_post)
            .transpose()?
            .ok_or(DomainError::EditConflict)
    }

    async fn clap_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = bounded(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(
                r#"
                UPDATE posts
                SET claps = claps + 1,
                    version = version + 1
                WHERE id = $1
                RETURNING id, created_at, updated_at, title, subtitle, content, tags,
                          claps, status, published_at, version, slug
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
            map_post_db_error,
        )
        .await?;

        row.map(map_row_to_post).transpose()
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = bounded(
            self.query_timeout,
            sqlx::query(
                r#"
                DELETE FROM posts
                WHERE id = $1
                "#,
            )
            .bind(id)
            .execute(&self.pool),
            map_post_db_error,
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_published(
        &self,
        search: &PostSearch,
        filter: Filter,
    ) -> Result<Page<Post>, DomainError> {
        // One ORDER BY for both modes: rank is constant when the query is empty,
        // so rows fall through to published_at.
        let rows = bounded(
            self.query_timeout,
            sqlx::query_as::<_, ListedPostRow>(
                r#"
                SELECT count(*) OVER() AS total_records,
                       id, created_at, updated_at, title, subtitle, content, tags,
                       claps, status, published_at, version, slug
                FROM posts
                WHERE status = 'published'
                  AND ($1 = '' OR to_tsvector('simple', title || ' ' || subtitle || ' ' || content)
                                  @@ plainto_tsquery('simple', $1))
                  AND tags @> $2
                ORDER BY
                    CASE WHEN $1 = '' THEN 0::real
                         ELSE ts_rank(
                             to_tsvector('simple', title || ' ' || subtitle || ' ' || content),
                             plainto_tsquery('simple', $1))
                    END DESC,
                    published_at DESC,
                    id DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(search.query.trim())
            .bind(&search.tags)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool),
            map_post_db_error,
        )
        .await?;

        let Some(total_records) = rows.first().map(|row| row.total_records) else {
            return Ok(Page::empty());
        };
        let items = rows
            .into_iter()
            .map(|row| map_row_to_post(row.post))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total_records,
        })
    }
}

fn map_row_to_post(row: PostRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.id,
        created_at: row.created_at,
        updated_at: row.updated_at,
        title: row.title,
        subtitle: row.subtitle,
        content: row.content,
        tags: row.tags,
        claps: row.claps,
        status: row.status.parse()?,
        published_at: row.published_at,
        version: row.version,
        slug: row.slug,
    })
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    classify_db_error(err, &POST_CONSTRAINTS)
}
