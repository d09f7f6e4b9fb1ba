use super::validation::Validator;

pub(crate) const MAX_PAGE: i64 = 10_000_000;
pub(crate) const MAX_PAGE_SIZE: i64 = 100;

/// Requested page window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Filter {
    pub(crate) page: i64,
    pub(crate) page_size: i64,
}

impl Filter {
    pub(crate) fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Out-of-range values are reported, never clamped.
    pub(crate) fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "must be greater than zero");
        v.check(self.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
        v.check(self.page_size > 0, "page_size", "must be greater than zero");
        v.check(
            self.page_size <= MAX_PAGE_SIZE,
            "page_size",
            "must be a maximum of 100",
        );
    }

    pub(crate) fn limit(&self) -> i64 {
        self.page_size
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Position of a result page within the full result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Metadata {
    pub(crate) current_page: i64,
    pub(crate) page_size: i64,
    pub(crate) first_page: i64,
    pub(crate) last_page: i64,
    pub(crate) total_records: i64,
}

pub(crate) fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records <= 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}
