use axum::Router;
use axum::routing::{get, post, put};

use crate::presentation::AppState;
use crate::presentation::handlers::users::{activate, me, register};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/activated", put(activate))
        .route("/me", get(me))
}
