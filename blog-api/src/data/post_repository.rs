use async_trait::async_trait;

use crate::data::Page;
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) slug: String,
}

/// Free-text query and required tags of a published-posts listing.
#[derive(Debug, Clone, Default)]
pub(crate) struct PostSearch {
    pub(crate) query: String,
    pub(crate) tags: Vec<String>,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Writes `post` only if the stored version still equals `post.version`.
    /// A version mismatch (or a vanished row) is `DomainError::EditConflict`.
    async fn update_post(&self, post: &Post) -> Result<Post, DomainError>;
    async fn publish_post(&self, id: i64, expected_version: i32) -> Result<Post, DomainError>;
    async fn clap_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_published(
        &self,
        search: &PostSearch,
        filter: Filter,
    ) -> Result<Page<Post>, DomainError>;
}
