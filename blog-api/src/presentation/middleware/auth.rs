use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::error::DomainError;
use crate::domain::user::User;
use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

/// Who is making the request, resolved once per request by [`authenticate`].
#[derive(Debug, Clone)]
pub(crate) enum CurrentUser {
    Anonymous,
    User(User),
}

/// Any signed-in user.
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser(pub(crate) User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(CurrentUser::User(user)) => Ok(AuthenticatedUser(user.clone())),
            _ => Err(AppError::AuthenticationRequired),
        }
    }
}

/// A signed-in user whose account has been activated.
#[derive(Debug, Clone)]
pub(crate) struct ActivatedUser(pub(crate) User);

impl<S> FromRequestParts<S> for ActivatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.activated {
            return Err(AppError::InactiveAccount);
        }
        Ok(ActivatedUser(user))
    }
}

/// Resolves the bearer token (if any) into a [`CurrentUser`] extension.
/// No header means anonymous; a bad header or token is rejected outright.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut response = match resolve_current_user(&state, request.headers()).await {
        Ok(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve_current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<CurrentUser, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(CurrentUser::Anonymous);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(AppError::InvalidAuthenticationToken)?;

    match state.auth_service.authenticate(token).await {
        Ok(user) => Ok(CurrentUser::User(user)),
        Err(DomainError::InvalidCredentials) => Err(AppError::InvalidAuthenticationToken),
        Err(err) => Err(err.into()),
    }
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}
