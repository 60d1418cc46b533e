//! Pagination envelope shared by every list operation.
//!
//! Callers pass `page` / `per_page` as loosely typed JSON values; this module
//! normalizes them into a bounded request and wraps query results in the
//! `{ data, pagination }` envelope.

use serde::Serialize;
use serde_json::Value;

use crate::serde_utils::value_as_i64;

/// Page size applied when the caller sends nothing usable.
pub const DEFAULT_PER_PAGE: i64 = 15;

/// Hard ceiling on page size regardless of caller input.
pub const MAX_PER_PAGE: i64 = 100;

/// Normalized paging parameters.
///
/// `per_page` out of bounds collapses to the default (too small) or the
/// maximum (too large); `page` below 1 or non-numeric collapses to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Build a request from raw caller input.
    pub fn from_raw(page: Option<&Value>, per_page: Option<&Value>) -> Self {
        let per_page = match per_page.and_then(value_as_i64) {
            Some(n) if n >= 1 => n.min(MAX_PER_PAGE),
            _ => DEFAULT_PER_PAGE,
        };

        let page = match page.and_then(value_as_i64) {
            Some(n) if n >= 1 => n,
            _ => 1,
        };

        Self { page, per_page }
    }

    /// SQL LIMIT for this request.
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    /// SQL OFFSET for this request.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// Metadata for a result set of `total` matching rows.
    ///
    /// A request past the end still reports the true totals; the data slice
    /// is simply empty.
    pub fn envelope(&self, total: i64) -> Pagination {
        let total = total.max(0);
        let last_page = if total == 0 {
            1
        } else {
            (total + self.per_page - 1) / self.per_page
        };

        Pagination {
            current_page: self.page,
            per_page: self.per_page,
            total,
            last_page,
        }
    }
}

/// Pagination metadata returned alongside every page of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

/// A page of projected records plus its metadata.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: request.envelope(total),
        }
    }
}
