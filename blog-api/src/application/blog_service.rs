use super::Listing;
use crate::data::post_repository::{NewPost, PostRepository, PostSearch};
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;
use crate::domain::post::{CreatePostRequest, MAX_TAGS, Post, UpdatePostRequest, generate_slug};
use crate::domain::validation::{Validator, unique};

/// Parameters of the published-posts listing, as received from the caller.
#[derive(Debug, Clone)]
pub(crate) struct ListPostsQuery {
    pub(crate) query: String,
    pub(crate) tags: Vec<String>,
    pub(crate) filter: Filter,
}

impl ListPostsQuery {
    fn validate(self) -> Result<(PostSearch, Filter), DomainError> {
        let query = self.query.trim().to_string();
        let tags: Vec<String> = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        let mut v = Validator::new();
        self.filter.validate(&mut v);
        v.check(tags.len() <= MAX_TAGS, "tags", "must not contain more than 5 tags");
        v.check(unique(&tags), "tags", "must not contain duplicate values");
        v.finish()?;

        Ok((PostSearch { query, tags }, self.filter))
    }
}

pub(crate) struct BlogService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> BlogService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let new_post = NewPost {
            slug: generate_slug(&req.title),
            title: req.title,
            subtitle: req.subtitle,
            content: req.content,
            tags: req.tags,
        };
        self.repo.create_post(new_post).await
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    /// Applies a partial edit under optimistic concurrency. When the caller
    /// names the version it last read, a different stored version is a conflict.
    pub(crate) async fn update_post(
        &self,
        id: i64,
        req: UpdatePostRequest,
        expected_version: Option<i32>,
    ) -> Result<Post, DomainError> {
        let mut post = self.get_post(id).await?;
        check_version(post.version, expected_version)?;

        post.apply(req);
        post.validate()?;

        self.repo.update_post(&post).await
    }

    pub(crate) async fn delete_post(&self, id: i64) -> Result<(), DomainError> {
        if !self.repo.delete_post(id).await? {
            return Err(post_not_found(id));
        }
        Ok(())
    }

    pub(crate) async fn publish_post(
        &self,
        id: i64,
        expected_version: Option<i32>,
    ) -> Result<Post, DomainError> {
        let post = self.get_post(id).await?;
        check_version(post.version, expected_version)?;

        if post.is_published() {
            return Err(DomainError::invalid("status", "post is already published"));
        }

        self.repo.publish_post(post.id, post.version).await
    }

    pub(crate) async fn clap_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .clap_post(id)
            .await?
            .ok_or_else(|| post_not_found(id))
    }

    pub(crate) async fn list_published(
        &self,
        query: ListPostsQuery,
    ) -> Result<Listing<Post>, DomainError> {
        let (search, filter) = query.validate()?;
        let page = self.repo.list_published(&search, filter).await?;
        Ok(Listing::from_page(page, filter))
    }
}

fn check_version(stored: i32, expected: Option<i32>) -> Result<(), DomainError> {
    match expected {
        Some(expected) if expected != stored => Err(DomainError::EditConflict),
        _ => Ok(()),
    }
}

fn post_not_found(id: i64) -> DomainError {
    DomainError::NotFound(format!("post id: {id}"))
}
