use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppJson;
use crate::domain::user::{RegisterRequest, User};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppResult, ErrorBody};
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RegisterDto {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct ActivateDto {
    pub(crate) token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) activated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct UserEnvelope {
    pub(crate) user: UserDto,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            username: user.username,
            email: user.email,
            activated: user.activated,
        }
    }
}

impl From<User> for UserEnvelope {
    fn from(user: User) -> Self {
        Self { user: user.into() }
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterDto,
    responses(
        (status = 202, description = "Registered; activation mail queued", body = UserEnvelope),
        (status = 400, description = "Malformed JSON", body = ErrorBody),
        (status = 422, description = "Validation error or duplicate email/username", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    AppJson(dto): AppJson<RegisterDto>,
) -> AppResult<(StatusCode, Json<UserEnvelope>)> {
    let req = RegisterRequest {
        username: dto.username,
        email: dto.email,
        password: dto.password,
    };

    let user = state.auth_service.register(req).await?;

    Ok((StatusCode::ACCEPTED, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/users/activated",
    tag = "users",
    request_body = ActivateDto,
    responses(
        (status = 200, description = "Account activated", body = UserEnvelope),
        (status = 409, description = "Edit conflict", body = ErrorBody),
        (status = 422, description = "Invalid or expired activation token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub(crate) async fn activate(
    State(state): State<AppState>,
    AppJson(dto): AppJson<ActivateDto>,
) -> AppResult<(StatusCode, Json<UserEnvelope>)> {
    let user = state.auth_service.activate(&dto.token).await?;

    Ok((StatusCode::OK, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Authentication required", body = ErrorBody)
    )
)]
pub(crate) async fn me(
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<(StatusCode, Json<UserEnvelope>)> {
    Ok((StatusCode::OK, Json(user.into())))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::UserEnvelope;
    use crate::domain::user::User;

    #[test]
    fn user_envelope_hides_version() {
        let user = User {
            id: 3,
            created_at: Utc::now(),
            username: "alice_writer".to_string(),
            email: "alice@example.com".to_string(),
            activated: false,
            version: 4,
        };

        let json = serde_json::to_value(UserEnvelope::from(user)).expect("must serialise");
        assert_eq!(json["user"]["username"], "alice_writer");
        assert_eq!(json["user"]["activated"], false);
        assert!(json["user"].get("version").is_none());
        assert!(json["user"].get("password").is_none());
    }
}
