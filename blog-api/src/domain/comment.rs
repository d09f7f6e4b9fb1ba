use chrono::{DateTime, Utc};

use super::error::DomainError;
use super::validation::Validator;

pub(crate) const MIN_BODY_LEN: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) body: String,
    pub(crate) user_id: i64,
    pub(crate) post_id: i64,
    pub(crate) version: i32,
}

impl Comment {
    /// True when `user_id` wrote this comment under `post_id`.
    pub(crate) fn is_owned_by(&self, user_id: i64, post_id: i64) -> bool {
        self.user_id == user_id && self.post_id == post_id
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CommentRequest {
    pub(crate) body: String,
}

impl CommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let body = self.body.trim().to_string();

        let mut v = Validator::new();
        v.check(!body.is_empty(), "body", "must be provided");
        v.check(
            body.len() >= MIN_BODY_LEN,
            "body",
            "must be at least 10 characters long",
        );
        v.finish()?;

        Ok(Self { body })
    }
}
