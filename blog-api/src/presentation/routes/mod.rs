use axum::Router;

use super::AppState;

pub(crate) mod posts;
pub(crate) mod tokens;
pub(crate) mod users;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/posts", posts::router())
        .nest("/api/users", users::router())
        .nest("/api/tokens", tokens::router())
}
