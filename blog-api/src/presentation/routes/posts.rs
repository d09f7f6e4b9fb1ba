use axum::Router;
use axum::routing::{get, patch, post};

use crate::presentation::AppState;
use crate::presentation::handlers::comments::{
    create_comment, delete_comment, list_comments, update_comment,
};
use crate::presentation::handlers::posts::{
    clap_post, create_post, delete_post, get_post, list_posts, publish_post, update_post,
};

/// Access checks live in the handler extractors, so every route shares one router.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/{id}", get(get_post).patch(update_post).delete(delete_post))
        .route("/{id}/publish", post(publish_post))
        .route("/{id}/clap", post(clap_post))
        .route("/{id}/comments", get(list_comments).post(create_comment))
        .route(
            "/{id}/comments/{comment_id}",
            patch(update_comment).delete(delete_comment),
        )
}
