use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppJson;
use crate::domain::token::Token;
use crate::domain::user::CredentialsRequest;
use crate::presentation::AppState;
use crate::presentation::app_error::{AppResult, ErrorBody};

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CredentialsDto {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthenticationTokenDto {
    pub(crate) token: String,
    pub(crate) expiry: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AuthenticationTokenEnvelope {
    pub(crate) authentication_token: AuthenticationTokenDto,
}

impl From<Token> for AuthenticationTokenEnvelope {
    fn from(token: Token) -> Self {
        Self {
            authentication_token: AuthenticationTokenDto {
                token: token.plaintext,
                expiry: token.expiry,
            },
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/tokens/authentication",
    tag = "tokens",
    request_body = CredentialsDto,
    responses(
        (status = 201, description = "Bearer token issued", body = AuthenticationTokenEnvelope),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn create_authentication_token(
    State(state): State<AppState>,
    AppJson(dto): AppJson<CredentialsDto>,
) -> AppResult<(StatusCode, Json<AuthenticationTokenEnvelope>)> {
    let req = CredentialsRequest {
        email: dto.email,
        password: dto.password,
    };

    let token = state.auth_service.create_authentication_token(req).await?;

    Ok((StatusCode::CREATED, Json(token.into())))
}
