use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Every request gets a span carrying method and path, so errors logged
/// further down keep their request context.
pub(crate) fn apply_trace(router: Router) -> Router {
    router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request| -> Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    }))
}
