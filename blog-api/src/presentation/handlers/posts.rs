use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderName, StatusCode, header},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    AppJson, AppQuery, MessageResponse, MetadataDto, optional_json, parse_id, read_csv,
    read_filter,
};
use crate::application::Listing;
use crate::application::blog_service::ListPostsQuery;
use crate::domain::post::{CreatePostRequest, Post, UpdatePostRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppResult, ErrorBody};
use crate::presentation::middleware::auth::ActivatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreatePostDto {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) subtitle: String,
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdatePostDto {
    pub(crate) title: Option<String>,
    pub(crate) subtitle: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) tags: Option<Vec<String>>,
    /// Version last read; a different stored version is an edit conflict.
    /// When omitted the update applies to whatever version is stored, so the
    /// last writer wins.
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub(crate) version: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct PublishPostDto {
    /// Version last read. When omitted the stored version is published as is
    /// and no conflict is reported.
    #[validate(range(min = 1, message = "must be a positive integer"))]
    pub(crate) version: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ListPostsParams {
    /// Free-text search over title, subtitle and content.
    pub(crate) q: Option<String>,
    /// Comma-separated tags; a post must carry all of them.
    pub(crate) tags: Option<String>,
    pub(crate) page: Option<String>,
    pub(crate) page_size: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) title: String,
    pub(crate) subtitle: String,
    pub(crate) content: String,
    pub(crate) tags: Vec<String>,
    pub(crate) claps: i64,
    #[schema(example = "draft")]
    pub(crate) status: String,
    pub(crate) published_at: Option<DateTime<Utc>>,
    pub(crate) version: i32,
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostEnvelope {
    pub(crate) post: PostDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostListEnvelope {
    pub(crate) metadata: MetadataDto,
    pub(crate) posts: Vec<PostDto>,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            title: post.title,
            subtitle: post.subtitle,
            content: post.content,
            tags: post.tags,
            claps: post.claps,
            status: post.status.to_string(),
            published_at: post.published_at,
            version: post.version,
            slug: post.slug,
        }
    }
}

impl From<Post> for PostEnvelope {
    fn from(post: Post) -> Self {
        Self { post: post.into() }
    }
}

impl From<Listing<Post>> for PostListEnvelope {
    fn from(listing: Listing<Post>) -> Self {
        Self {
            metadata: listing.metadata.into(),
            posts: listing.items.into_iter().map(PostDto::from).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(ListPostsParams),
    responses(
        (status = 200, description = "Published posts, best match first", body = PostListEnvelope),
        (status = 400, description = "Malformed query string", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 403, description = "Account not activated", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    AppQuery(params): AppQuery<ListPostsParams>,
) -> AppResult<(StatusCode, Json<PostListEnvelope>)> {
    let filter = read_filter(
        params.page.as_deref(),
        params.page_size.as_deref(),
        state.default_page_size,
    )?;
    let query = ListPostsQuery {
        query: params.q.unwrap_or_default(),
        tags: read_csv(params.tags.as_deref()),
        filter,
    };

    let listing = state.blog_service.list_published(query).await?;

    Ok((StatusCode::OK, Json(listing.into())))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post found", body = PostEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostEnvelope>)> {
    let id = parse_id(&id)?;
    let post = state.blog_service.get_post(id).await?;

    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(("bearer_auth" = [])),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Draft created", body = PostEnvelope),
        (status = 400, description = "Malformed JSON", body = ErrorBody),
        (status = 401, description = "Authentication required", body = ErrorBody),
        (status = 403, description = "Account not activated", body = ErrorBody),
        (status = 422, description = "Validation error or duplicate slug", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    AppJson(dto): AppJson<CreatePostDto>,
) -> AppResult<(StatusCode, [(HeaderName, String); 1], Json<PostEnvelope>)> {
    let req = CreatePostRequest {
        title: dto.title,
        subtitle: dto.subtitle,
        content: dto.content,
        tags: dto.tags,
    };

    let post = state.blog_service.create_post(req).await?;
    let location = format!("/api/posts/{}", post.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(post.into()),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = PostEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Validation error or duplicate slug", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<PostEnvelope>)> {
    let id = parse_id(&id)?;
    dto.validate()?;

    let req = UpdatePostRequest {
        title: dto.title,
        subtitle: dto.subtitle,
        content: dto.content,
        tags: dto.tags,
    };

    let post = state.blog_service.update_post(id, req, dto.version).await?;

    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let id = parse_id(&id)?;
    state.blog_service.delete_post(id).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("post successfully deleted")),
    ))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/publish",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    request_body(content = PublishPostDto, description = "Optional version guard; the body may be omitted"),
    responses(
        (status = 200, description = "Post published", body = PostEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Post already published", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn publish_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<PostEnvelope>)> {
    let id = parse_id(&id)?;
    let dto: PublishPostDto = optional_json(&body)?.unwrap_or_default();
    dto.validate()?;

    let post = state.blog_service.publish_post(id, dto.version).await?;

    Ok((StatusCode::OK, Json(post.into())))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/clap",
    tag = "posts",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Clap recorded", body = PostEnvelope),
        (status = 404, description = "Post not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn clap_post(
    State(state): State<AppState>,
    ActivatedUser(_user): ActivatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<PostEnvelope>)> {
    let id = parse_id(&id)?;
    let post = state.blog_service.clap_post(id).await?;

    Ok((StatusCode::OK, Json(post.into())))
}
