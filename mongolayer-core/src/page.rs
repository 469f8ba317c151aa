//! Pagination parameters and result metadata.
//!
//! Pages are 1-indexed. The repository turns [`PaginationParams`] into a skip/limit pair,
//! counts the matching documents and returns a [`Page`] carrying both the items and the
//! [`PaginationResult`] metadata.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Which page to retrieve and how many items it holds.
///
/// # Example
///
/// ```ignore
/// use mongolayer::page::PaginationParams;
///
/// let params = PaginationParams::new(3, 20);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// The page number (1-indexed).
    pub page: u64,
    /// Number of items per page.
    pub page_size: u64,
}

impl PaginationParams {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    pub fn builder() -> PaginationParamsBuilder {
        PaginationParamsBuilder::new()
    }

    /// Number of items to skip for this page. Page 0 is treated as page 1.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

/// Builder for [`PaginationParams`]. Unset values fall back to page 1 and
/// [`DEFAULT_PAGE_SIZE`].
#[derive(Debug, Default)]
pub struct PaginationParamsBuilder {
    page: Option<u64>,
    page_size: Option<u64>,
}

impl PaginationParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn build(self) -> PaginationParams {
        PaginationParams {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

/// Metadata describing one page of a larger result set.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaginationResult {
    pub page: u64,
    pub page_size: u64,
    /// Total number of matching documents.
    pub total: u64,
    /// Total number of pages, `ceil(total / page_size)`.
    pub total_page: u64,
}

impl PaginationResult {
    /// Computes the metadata for `params` over `total` matching documents.
    pub fn new(params: PaginationParams, total: u64) -> Self {
        let total_page = if params.page_size == 0 { 0 } else { total.div_ceil(params.page_size) };

        Self {
            page: params.page,
            page_size: params.page_size,
            total,
            total_page,
        }
    }

    /// The next page number, if there is one.
    pub fn next_page(&self) -> Option<u64> {
        (self.page < self.total_page).then(|| self.page + 1)
    }

    /// The previous page number, if this is not the first page.
    pub fn previous_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }
}

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use mongolayer::page::{Page, PaginationParams, PaginationResult};
///
/// let params = PaginationParams::new(1, 2);
/// let page = Page::new(vec!["a", "b"], PaginationResult::new(params, 5));
///
/// assert_eq!(page.pagination.total_page, 3);
/// assert_eq!(page.next_page(), Some(2));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: PaginationResult) -> Self {
        Self { items, pagination }
    }

    pub fn next_page(&self) -> Option<u64> {
        self.pagination.next_page()
    }

    pub fn previous_page(&self) -> Option<u64> {
        self.pagination.previous_page()
    }

    /// Maps the items while keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: PaginationResult::default(),
        }
    }
}
