use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> first message recorded against it.
pub(crate) type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate value for '{field}'")]
    Duplicate { field: &'static str },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("store operation timed out")]
    Timeout,

    #[error("unexpected domain error: {0}")]
    Unexpected(String),
}

impl DomainError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, message.into());
        DomainError::Validation(errors)
    }
}
