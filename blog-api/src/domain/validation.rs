use std::collections::HashSet;
use std::hash::Hash;

use validator::ValidateEmail;

use super::error::{DomainError, FieldErrors};

/// Collects field-level rule violations for a single request.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `field` unless the field already has one.
    pub(crate) fn add_error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub(crate) fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub(crate) fn finish(self) -> Result<(), DomainError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.errors))
        }
    }
}

pub(crate) fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|value| seen.insert(value))
}

pub(crate) fn is_email(value: &str) -> bool {
    value.validate_email()
}
