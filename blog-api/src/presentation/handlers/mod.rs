use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query};
use serde::Serialize;
use serde::de::DeserializeOwned;
use utoipa::ToSchema;

use crate::domain::filter::{Filter, Metadata};
use crate::domain::validation::Validator;
use crate::presentation::app_error::{AppError, AppResult};

pub(crate) mod comments;
pub(crate) mod posts;
pub(crate) mod tokens;
pub(crate) mod users;

/// `Json` whose rejection renders through [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub(crate) struct AppJson<T>(pub(crate) T);

/// `Query` whose rejection renders through [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub(crate) struct AppQuery<T>(pub(crate) T);

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MessageResponse {
    pub(crate) message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination metadata; zero fields are omitted, so an empty result renders `{}`.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MetadataDto {
    #[serde(skip_serializing_if = "is_zero")]
    pub(crate) current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub(crate) page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub(crate) first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub(crate) last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub(crate) total_records: i64,
}

impl From<Metadata> for MetadataDto {
    fn from(metadata: Metadata) -> Self {
        Self {
            current_page: metadata.current_page,
            page_size: metadata.page_size,
            first_page: metadata.first_page,
            last_page: metadata.last_page,
            total_records: metadata.total_records,
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Path ids are positive integers; anything else cannot name a resource.
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

/// Builds the page window from raw query values. Non-numeric values are
/// reported per field; range checks happen in the services.
pub(crate) fn read_filter(
    page: Option<&str>,
    page_size: Option<&str>,
    default_page_size: i64,
) -> AppResult<Filter> {
    let mut v = Validator::new();
    let page = read_int(&mut v, "page", page, 1);
    let page_size = read_int(&mut v, "page_size", page_size, default_page_size);
    v.finish()?;
    Ok(Filter::new(page, page_size))
}

fn read_int(v: &mut Validator, field: &'static str, raw: Option<&str>, default: i64) -> i64 {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            v.add_error(field, "must be an integer value");
            default
        }),
    }
}

/// Comma-separated list; blank entries are dropped.
pub(crate) fn read_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Decodes a JSON body that may be absent altogether.
pub(crate) fn optional_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|err| AppError::BadRequest(format!("body contains badly-formed JSON: {err}")))
}
