use std::future::Future;
use std::time::Duration;

use crate::domain::error::DomainError;

pub(crate) mod comment_repository;
pub(crate) mod post_repository;
pub(crate) mod token_repository;
pub(crate) mod user_repository;

#[cfg(test)]
mod tests;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Constraint name -> the domain field (unique) or resource (foreign key) it guards.
pub(crate) struct ConstraintMap {
    pub(crate) unique: &'static [(&'static str, &'static str)],
    pub(crate) foreign: &'static [(&'static str, &'static str)],
}

/// Runs one store operation, abandoning it once `deadline` passes.
pub(crate) async fn bounded<T, F>(
    deadline: Duration,
    operation: F,
    classify: fn(sqlx::Error) -> DomainError,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result.map_err(classify),
        Err(_) => {
            tracing::warn!(deadline_ms = deadline.as_millis() as u64, "store operation timed out");
            Err(DomainError::Timeout)
        }
    }
}

/// Classifies by SQLSTATE and constraint name, never by message text.
pub(crate) fn classify_db_error(err: sqlx::Error, constraints: &ConstraintMap) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && let Some(constraint) = db_err.constraint()
    {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                if let Some(field) = lookup(constraints.unique, constraint) {
                    return DomainError::Duplicate { field };
                }
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                if let Some(resource) = lookup(constraints.foreign, constraint) {
                    return DomainError::NotFound(resource.to_string());
                }
            }
            _ => {}
        }
    }

    if matches!(err, sqlx::Error::PoolTimedOut) {
        return DomainError::Timeout;
    }

    DomainError::Unexpected(err.to_string())
}

fn lookup(table: &[(&'static str, &'static str)], constraint: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, value)| *value)
}
