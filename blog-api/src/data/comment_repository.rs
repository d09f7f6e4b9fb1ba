use async_trait::async_trait;

use crate::data::Page;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) body: String,
    pub(crate) user_id: i64,
    pub(crate) post_id: i64,
}

#[async_trait]
pub(crate) trait CommentRepository: Send + Sync {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError>;
    async fn list_for_post(&self, post_id: i64, filter: Filter)
    -> Result<Page<Comment>, DomainError>;
    /// Conditional on id, owner, post and version; zero matches is `EditConflict`.
    async fn update_comment(&self, comment: &Comment) -> Result<Comment, DomainError>;
    /// Deletes only when all three ids match one row.
    async fn delete_comment(
        &self,
        comment_id: i64,
        user_id: i64,
        post_id: i64,
    ) -> Result<bool, DomainError>;
}
