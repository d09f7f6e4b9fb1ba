use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::domain::error::DomainError;

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("invalid or missing authentication token")]
    InvalidAuthenticationToken,

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("inactive account")]
    InactiveAccount,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request timed out")]
    RequestTimeout,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Either a single message or one message per offending field.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub(crate) enum ErrorMessage {
    Text(String),
    Fields(BTreeMap<String, String>),
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorBody {
    pub(crate) error: ErrorMessage,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut bearer_challenge = false;

        let (status, message) = match self {
            AppError::Domain(err) => match err {
                DomainError::Validation(errors) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorMessage::Fields(
                        errors
                            .into_iter()
                            .map(|(field, message)| (field.to_string(), message))
                            .collect(),
                    ),
                ),
                DomainError::Duplicate { field } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorMessage::Fields(BTreeMap::from([(
                        field.to_string(),
                        duplicate_message(field),
                    )])),
                ),
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, not_found_message()),
                DomainError::EditConflict => (
                    StatusCode::CONFLICT,
                    ErrorMessage::Text(
                        "unable to update the record due to an edit conflict, please try again"
                            .to_string(),
                    ),
                ),
                DomainError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    ErrorMessage::Text("invalid authentication credentials".to_string()),
                ),
                DomainError::Timeout | DomainError::Unexpected(_) => {
                    tracing::error!(error = %err, "request failed");
                    server_error()
                }
            },
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorMessage::Fields(first_messages(&errors)),
            ),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorMessage::Text(message)),
            AppError::NotFound => (StatusCode::NOT_FOUND, not_found_message()),
            AppError::InvalidAuthenticationToken => {
                bearer_challenge = true;
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorMessage::Text("invalid or missing authentication token".to_string()),
                )
            }
            AppError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                ErrorMessage::Text("you must be authenticated to access this resource".to_string()),
            ),
            AppError::InactiveAccount => (
                StatusCode::FORBIDDEN,
                ErrorMessage::Text(
                    "your user account must be activated to access this resource".to_string(),
                ),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorMessage::Text("rate limit exceeded".to_string()),
            ),
            AppError::RequestTimeout => (
                StatusCode::REQUEST_TIMEOUT,
                ErrorMessage::Text("request timed out".to_string()),
            ),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                server_error()
            }
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if bearer_challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

fn server_error() -> (StatusCode, ErrorMessage) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorMessage::Text(SERVER_ERROR_MESSAGE.to_string()),
    )
}

fn not_found_message() -> ErrorMessage {
    ErrorMessage::Text("the requested resource could not be found".to_string())
}

fn duplicate_message(field: &str) -> String {
    match field {
        "email" => "a user with this email address already exists".to_string(),
        "username" => "a user with this username already exists".to_string(),
        "slug" => "a post with this title already exists".to_string(),
        other => format!("a record with this {other} already exists"),
    }
}

fn first_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}
