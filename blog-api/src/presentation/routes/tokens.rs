use axum::{Router, routing::post};

use crate::presentation::AppState;
use crate::presentation::handlers::tokens::create_authentication_token;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/authentication", post(create_authentication_token))
}
