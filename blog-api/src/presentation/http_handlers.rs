use axum::{
    Json, Router,
    extract::State,
    http::header,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::app_error::{AppError, AppResult};
use super::middleware::auth::authenticate;
use super::{AppState, routes};

/// API routes behind bearer-token resolution.
pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/healthcheck", get(healthcheck))
        .route("/metrics", get(metrics))
        .merge(routes::router())
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthcheckResponse {
    pub(crate) status: String,
    pub(crate) environment: String,
    pub(crate) version: String,
}

#[utoipa::path(
    get,
    path = "/api/healthcheck",
    tag = "system",
    responses((status = 200, description = "Service is available", body = HealthcheckResponse))
)]
pub(crate) async fn healthcheck(State(state): State<AppState>) -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse {
        status: "available".to_string(),
        environment: state.environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus text exposition of the request counters and build info.
pub(crate) async fn metrics(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|err| AppError::Internal(err.into()))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
