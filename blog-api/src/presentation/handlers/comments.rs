use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{AppJson, AppQuery, MessageResponse, MetadataDto, parse_id, read_filter};
use crate::application::Listing;
use crate::domain::comment::{Comment, CommentRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppResult, ErrorBody};
use crate::presentation::middleware::auth::ActivatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateCommentDto {
    pub(crate) body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateCommentDto {
    pub(crate) body: String,
    /// Version last read. When omitted the last writer wins.
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub(crate) version: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ListCommentsParams {
    pub(crate) page: Option<String>,
    pub(crate) page_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) body: String,
    pub(crate) user_id: i64,
    pub(crate) post_id: i64,
    pub(crate) version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentEnvelope {
    pub(crate) comment: CommentDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentListEnvelope {
    pub(crate) metadata: MetadataDto,
    pub(crate) comments: Vec<CommentDto>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            body: comment.body,
            user_id: comment.user_id,
            post_id: comment.post_id,
            version: comment.version,
        }
    }
}

impl From<Comment> for CommentEnvelope {
    fn from(comment: Comment) -> Self {
        Self {
            comment: comment.into(),
        }
    }
}

impl From<Listing<Comment>> for CommentListEnvelope {
    fn from(listing: Listing<Comment>) -> Self {
        Self {
            metadata: listing.metadata.into(),
            comments: listing.items.into_iter().map(CommentDto::from).collect(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = CommentEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    ActivatedUser(user): ActivatedUser,
    Path(post_id): Path<String>,
    AppJson(dto): AppJson<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentEnvelope>)> {
    let post_id = parse_id(&post_id)?;

    let comment = state
        .comment_service
        .create_comment(user.id, post_id, CommentRequest { body: dto.body })
        .await?;

    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id"), ListCommentsParams),
    responses(
        (status = 200, description = "Comments in creation order", body = CommentListEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(post_id): Path<String>,
    AppQuery(params): AppQuery<ListCommentsParams>,
) -> AppResult<(StatusCode, Json<CommentListEnvelope>)> {
    let post_id = parse_id(&post_id)?;
    let filter = read_filter(
        params.page.as_deref(),
        params.page_size.as_deref(),
        state.default_page_size,
    )?;

    let listing = state.comment_service.list_comments(post_id, filter).await?;

    Ok((StatusCode::OK, Json(listing.into())))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = UpdateCommentDto,
    responses(
        (status = 200, description = "Comment updated", body = CommentEnvelope),
        (status = 404, description = "Comment not found for this user and post", body = ErrorBody),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn update_comment(
    State(state): State<AppState>,
    ActivatedUser(user): ActivatedUser,
    Path((post_id, comment_id)): Path<(String, String)>,
    AppJson(dto): AppJson<UpdateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentEnvelope>)> {
    let post_id = parse_id(&post_id)?;
    let comment_id = parse_id(&comment_id)?;
    dto.validate()?;

    let comment = state
        .comment_service
        .update_comment(
            user.id,
            post_id,
            comment_id,
            CommentRequest { body: dto.body },
            dto.version,
        )
        .await?;

    Ok((StatusCode::OK, Json(comment.into())))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Post id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 404, description = "Comment not found for this user and post", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    ActivatedUser(user): ActivatedUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let post_id = parse_id(&post_id)?;
    let comment_id = parse_id(&comment_id)?;

    state
        .comment_service
        .delete_comment(user.id, post_id, comment_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("comment successfully deleted")),
    ))
}
