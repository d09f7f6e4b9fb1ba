use crate::data::Page;
use crate::domain::filter::{Filter, Metadata, calculate_metadata};

pub(crate) mod auth_service;
pub(crate) mod blog_service;
pub(crate) mod comment_service;

/// A result page together with its pagination metadata.
#[derive(Debug, Clone)]
pub(crate) struct Listing<T> {
    pub(crate) items: Vec<T>,
    pub(crate) metadata: Metadata,
}

impl<T> Listing<T> {
    pub(crate) fn from_page(page: Page<T>, filter: Filter) -> Self {
        Self {
            metadata: calculate_metadata(page.total_records, filter.page, filter.page_size),
            items: page.items,
        }
    }
}
