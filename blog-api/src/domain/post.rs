use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::validation::{Validator, unique};

pub(crate) const MAX_TAGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(DomainError::Unexpected(format!("unknown post status: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) claps: i64,
    pub(crate) status: PostStatus,
    pub(crate) published_at: Option<DateTime<Utc>>,
    pub(crate) version: i32,
    pub(crate) slug: String,
}

impl Post {
    pub(crate) fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Applies a partial edit. The slug is regenerated only when the title changes.
    pub(crate) fn apply(&mut self, edit: UpdatePostRequest) {
        if let Some(title) = edit.title {
            let title = title.trim().to_string();
            if title != self.title {
                self.slug = generate_slug(&title);
                self.title = title;
            }
        }
        if let Some(subtitle) = edit.subtitle {
            self.subtitle = subtitle.trim().to_string();
        }
        if let Some(content) = edit.content {
            self.content = content.trim().to_string();
        }
        if let Some(tags) = edit.tags {
            self.tags = normalize_tags(tags);
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DomainError> {
        let mut v = Validator::new();
        validate_post_fields(&mut v, &self.title, &self.subtitle, &self.content, &self.tags);
        v.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let req = Self {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            content: self.content.trim().to_string(),
            tags: normalize_tags(self.tags),
        };

        let mut v = Validator::new();
        validate_post_fields(&mut v, &req.title, &req.subtitle, &req.content, &req.tags);
        v.finish()?;

        Ok(req)
    }
}

/// Partial edit; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: Option<String>,
    pub(crate) subtitle: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
}

/// Lower-cased title words joined by single hyphens.
pub(crate) fn generate_slug(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().map(|tag| tag.trim().to_string()).collect()
}

fn validate_post_fields(
    v: &mut Validator,
    title: &str,
    subtitle: &str,
    content: &str,
    tags: &[String],
) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(title.len() >= 10, "title", "must be at least 10 bytes long");
    v.check(title.len() <= 120, "title", "must not be more than 120 bytes long");

    v.check(
        subtitle.len() <= 200,
        "subtitle",
        "must not be more than 200 bytes long",
    );

    v.check(!content.is_empty(), "content", "must be provided");
    v.check(content.len() >= 20, "content", "must be at least 20 bytes long");
    v.check(
        content.len() <= 10_000,
        "content",
        "must not be more than 10000 bytes long",
    );

    v.check(!tags.is_empty(), "tags", "must contain at least 1 tag");
    v.check(tags.len() <= MAX_TAGS, "tags", "must not contain more than 5 tags");
    v.check(
        tags.iter().all(|tag| !tag.is_empty()),
        "tags",
        "must not contain empty values",
    );
    v.check(unique(tags), "tags", "must not contain duplicate values");
}
