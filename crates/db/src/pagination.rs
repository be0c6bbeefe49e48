//! Page requests and pagination metadata for list views.

use facility_admin_common::{AppError, AppResult};
use serde::Serialize;

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Validate a page request against the configured maximum page size.
    pub fn new(page: u64, page_size: u64, max_page_size: u64) -> AppResult<Self> {
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if page_size == 0 || page_size > max_page_size {
            return Err(AppError::Validation(format!(
                "pageSize must be between 1 and {max_page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Current page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows to skip before this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationMeta {
    /// Compute metadata for `request` given the total number of rows.
    #[must_use]
    pub const fn new(request: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(request.page_size);
        Self {
            current_page: request.page,
            page_size: request.page_size,
            total_count,
            total_pages,
            has_next: request.page < total_pages,
            has_previous: request.page > 1,
        }
    }
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    /// Wrap items fetched for `request`.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(request, total_count),
        }
    }

    /// Convert the items, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
