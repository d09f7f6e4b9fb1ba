use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::validation::{Validator, is_email};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim().to_string();
        let email = normalize_email(&self.email);

        let mut v = Validator::new();
        validate_username(&mut v, &username);
        validate_email(&mut v, &email);
        validate_password(&mut v, &self.password);
        v.finish()?;

        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CredentialsRequest {
    pub(crate) email: String,
    pub(crate) password: String,
}

impl CredentialsRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let email = normalize_email(&self.email);

        let mut v = Validator::new();
        validate_email(&mut v, &email);
        validate_password(&mut v, &self.password);
        v.finish()?;

        Ok(Self {
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) activated: bool,
    pub(crate) version: i32,
}

pub(crate) fn validate_username(v: &mut Validator, username: &str) {
    v.check(!username.is_empty(), "username", "must be provided");
    v.check(username.len() >= 8, "username", "must be at least 8 bytes long");
    v.check(username.len() <= 32, "username", "must not be more than 32 bytes long");
}

pub(crate) fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(is_email(email), "email", "must be a valid email address");
}

pub(crate) fn validate_password(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
