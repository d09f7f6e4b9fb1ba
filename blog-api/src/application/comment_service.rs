use super::Listing;
use crate::data::comment_repository::{CommentRepository, NewComment};
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, CommentRequest};
use crate::domain::error::DomainError;
use crate::domain::filter::Filter;
use crate::domain::validation::Validator;

pub(crate) struct CommentService<C: CommentRepository, P: PostRepository> {
    comments: C,
    posts: P,
}

impl<C: CommentRepository, P: PostRepository> CommentService<C, P> {
    pub(crate) fn new(comments: C, posts: P) -> Self {
        Self { comments, posts }
    }

    pub(crate) async fn create_comment(
        &self,
        user_id: i64,
        post_id: i64,
        req: CommentRequest,
    ) -> Result<Comment, DomainError> {
        let req = req.validate()?;
        self.ensure_post_exists(post_id).await?;

        self.comments
            .create_comment(NewComment {
                body: req.body,
                user_id,
                post_id,
            })
            .await
    }

    pub(crate) async fn list_comments(
        &self,
        post_id: i64,
        filter: Filter,
    ) -> Result<Listing<Comment>, DomainError> {
        let mut v = Validator::new();
        filter.validate(&mut v);
        v.finish()?;

        self.ensure_post_exists(post_id).await?;
        let page = self.comments.list_for_post(post_id, filter).await?;
        Ok(Listing::from_page(page, filter))
    }

    /// Only the author may edit, and only under the post the comment belongs to.
    /// Anything else looks like a missing comment to the caller.
    pub(crate) async fn update_comment(
        &self,
        user_id: i64,
        post_id: i64,
        comment_id: i64,
        req: CommentRequest,
        expected_version: Option<i32>,
    ) -> Result<Comment, DomainError> {
        let req = req.validate()?;

        let mut comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .filter(|comment| comment.is_owned_by(user_id, post_id))
            .ok_or_else(|| comment_not_found(comment_id))?;

        if let Some(expected) = expected_version
            && expected != comment.version
        {
            return Err(DomainError::EditConflict);
        }

        comment.body = req.body;
        self.comments.update_comment(&comment).await
    }

    pub(crate) async fn delete_comment(
        &self,
        user_id: i64,
        post_id: i64,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        if !self
            .comments
            .delete_comment(comment_id, user_id, post_id)
            .await?
        {
            return Err(comment_not_found(comment_id));
        }
        Ok(())
    }

    async fn ensure_post_exists(&self, post_id: i64) -> Result<(), DomainError> {
        match self.posts.get_post(post_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound(format!("post id: {post_id}"))),
        }
    }
}

fn comment_not_found(id: i64) -> DomainError {
    DomainError::NotFound(format!("comment id: {id}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::CommentService;
    use crate::data::Page;
    use crate::data::comment_repository::{CommentRepository, NewComment};
    use crate::data::post_repository::{NewPost, PostRepository, PostSearch};
    use crate::domain::comment::{Comment, CommentRequest};
    use crate::domain::error::DomainError;
    use crate::domain::filter::Filter;
    use crate::domain::post::{Post, PostStatus};

    #[derive(Clone, Default)]
    struct FakeCommentRepo {
        comments: Arc<Mutex<Vec<Comment>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl FakeCommentRepo {
        fn with(comment: Comment) -> Self {
            let repo = Self::default();
            repo.comments
                .lock()
                .expect("comments mutex poisoned")
                .push(comment);
            repo
        }

        fn calls(&self) -> usize {
            *self.calls.lock().expect("calls mutex poisoned")
        }

        fn touch(&self) {
            *self.calls.lock().expect("calls mutex poisoned") += 1;
        }
    }

    #[async_trait]
    impl CommentRepository for FakeCommentRepo {
        async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
            self.touch();
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            let comment = sample_comment(
                comments.len() as i64 + 1,
                input.user_id,
                input.post_id,
                &input.body,
            );
            comments.push(comment.clone());
            Ok(comment)
        }

        async fn get_comment(&self, id: i64) -> Result<Option<Comment>, DomainError> {
            self.touch();
            Ok(self
                .comments
                .lock()
                .expect("comments mutex poisoned")
                .iter()
                .find(|c| c.id == id)
                .cloned())
        }

        async fn list_for_post(
            &self,
            post_id: i64,
            filter: Filter,
        ) -> Result<Page<Comment>, DomainError> {
            self.touch();
            let all: Vec<Comment> = self
                .comments
                .lock()
                .expect("comments mutex poisoned")
                .iter()
                .filter(|c| c.post_id == post_id)
                .cloned()
                .collect();
            let total_records = all.len() as i64;
            let items = all
                .into_iter()
                .skip(filter.offset() as usize)
                .take(filter.limit() as usize)
                .collect::<Vec<_>>();
            if items.is_empty() {
                return Ok(Page::empty());
            }
            Ok(Page {
                items,
                total_records,
            })
        }

        async fn update_comment(&self, comment: &Comment) -> Result<Comment, DomainError> {
            self.touch();
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            let stored = comments
                .iter_mut()
                .find(|c| {
                    c.id == comment.id
                        && c.is_owned_by(comment.user_id, comment.post_id)
                        && c.version == comment.version
                })
                .ok_or(DomainError::EditConflict)?;
            stored.body = comment.body.clone();
            stored.version += 1;
            Ok(stored.clone())
        }

        async fn delete_comment(
            &self,
            comment_id: i64,
            user_id: i64,
            post_id: i64,
        ) -> Result<bool, DomainError> {
            self.touch();
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            let before = comments.len();
            comments.retain(|c| !(c.id == comment_id && c.is_owned_by(user_id, post_id)));
            Ok(comments.len() < before)
        }
    }

    #[derive(Clone)]
    struct FakePostRepo {
        existing: Vec<i64>,
    }

    #[async_trait]
    impl PostRepository for FakePostRepo {
        async fn create_post(&self, _input: NewPost) -> Result<Post, DomainError> {
            Err(DomainError::Unexpected("not used".to_string()))
        }

        async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
            if !self.existing.contains(&id) {
                return Ok(None);
            }
            let now = Utc::now();
            Ok(Some(Post {
                id,
                created_at: now,
                updated_at: now,
                title: "Existing Post Title".to_string(),
                subtitle: String::new(),
                content: "Existing post content body".to_string(),
                tags: vec!["rust".to_string()],
                claps: 0,
                status: PostStatus::Published,
                published_at: Some(now),
                version: 1,
                slug: "existing-post-title".to_string(),
            }))
        }

        async fn update_post(&self, _post: &Post) -> Result<Post, DomainError> {
            Err(DomainError::Unexpected("not used".to_string()))
        }

        async fn publish_post(&self, _id: i64, _v: i32) -> Result<Post, DomainError> {
            Err(DomainError::Unexpected("not used".to_string()))
        }

        async fn clap_post(&self, _id: i64) -> Result<Option<Post>, DomainError> {
            Ok(None)
        }

        async fn delete_post(&self, _id: i64) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn list_published(
            &self,
            _search: &PostSearch,
            _filter: Filter,
        ) -> Result<Page<Post>, DomainError> {
            Ok(Page::empty())
        }
    }

    fn sample_comment(id: i64, user_id: i64, post_id: i64, body: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
            post_id,
            version: 1,
        }
    }

    fn service(comments: FakeCommentRepo) -> CommentService<FakeCommentRepo, FakePostRepo> {
        CommentService::new(comments, FakePostRepo { existing: vec![1, 2] })
    }

    fn request(body: &str) -> CommentRequest {
        CommentRequest {
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn create_comment_on_existing_post() {
        let repo = FakeCommentRepo::default();
        let service = service(repo.clone());

        let comment = service
            .create_comment(7, 1, request("  A thoughtful remark.  "))
            .await
            .expect("create must succeed");

        assert_eq!(comment.body, "A thoughtful remark.");
        assert_eq!(comment.user_id, 7);
        assert_eq!(comment.post_id, 1);
    }

    #[tokio::test]
    async fn create_comment_validates_before_touching_store() {
        let repo = FakeCommentRepo::default();
        let service = service(repo.clone());

        let err = service
            .create_comment(7, 1, request("too short"))
            .await
            .expect_err("short body must fail");

        assert!(matches!(err, DomainError::Validation(ref e) if e.contains_key("body")));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn create_comment_on_missing_post_is_not_found() {
        let service = service(FakeCommentRepo::default());
        let err = service
            .create_comment(7, 99, request("A thoughtful remark."))
            .await
            .expect_err("missing post must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_comments_paginates_with_metadata() {
        let repo = FakeCommentRepo::default();
        let service = service(repo.clone());
        for i in 0..3 {
            service
                .create_comment(7, 1, request(&format!("comment body number {i}")))
                .await
                .expect("create must succeed");
        }

        let listing = service
            .list_comments(1, Filter::new(2, 2))
            .await
            .expect("listing must succeed");

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].body, "comment body number 2");
        assert_eq!(listing.metadata.current_page, 2);
        assert_eq!(listing.metadata.last_page, 2);
        assert_eq!(listing.metadata.total_records, 3);
    }

    #[tokio::test]
    async fn list_comments_for_missing_post_is_not_found() {
        let service = service(FakeCommentRepo::default());
        let err = service
            .list_comments(99, Filter::new(1, 20))
            .await
            .expect_err("missing post must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_by_owner_bumps_version() {
        let repo = FakeCommentRepo::with(sample_comment(1, 7, 1, "original comment body"));
        let service = service(repo);

        let updated = service
            .update_comment(7, 1, 1, request("edited comment body"), Some(1))
            .await
            .expect("update must succeed");

        assert_eq!(updated.body, "edited comment body");
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn update_by_other_user_or_post_is_not_found() {
        let repo = FakeCommentRepo::with(sample_comment(1, 7, 1, "original comment body"));
        let service = service(repo);

        for (user_id, post_id) in [(8, 1), (7, 2)] {
            let err = service
                .update_comment(user_id, post_id, 1, request("edited comment body"), None)
                .await
                .expect_err("foreign update must fail");
            assert!(matches!(err, DomainError::NotFound(_)));
        }
    }

    #[tokio::test]
    async fn update_with_stale_version_is_a_conflict() {
        let repo = FakeCommentRepo::with(sample_comment(1, 7, 1, "original comment body"));
        let service = service(repo);

        let err = service
            .update_comment(7, 1, 1, request("edited comment body"), Some(5))
            .await
            .expect_err("stale version must fail");

        assert!(matches!(err, DomainError::EditConflict));
    }

    #[tokio::test]
    async fn delete_requires_matching_owner_and_post() {
        let repo = FakeCommentRepo::with(sample_comment(1, 7, 1, "original comment body"));
        let service = service(repo);

        assert!(matches!(
            service.delete_comment(8, 1, 1).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_comment(7, 2, 1).await,
            Err(DomainError::NotFound(_))
        ));
        service
            .delete_comment(7, 1, 1)
            .await
            .expect("owner delete must succeed");
    }
}
