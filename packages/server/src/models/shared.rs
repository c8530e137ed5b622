use std::collections::HashSet;
use std::hash::Hash;

use serde::Serialize;

use crate::error::AppError;

/// Upper bound for any `limit` query parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 6)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 8)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        Self {
            page: page.number,
            per_page: page.size,
            total,
            total_pages: total.div_ceil(page.size),
        }
    }
}

/// A resolved page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    /// Resolve `page`/`limit` query values against a default page size.
    pub fn resolve(page: Option<u64>, limit: Option<u64>, default_size: u64) -> Self {
        Self {
            number: Ord::max(page.unwrap_or(1), 1),
            size: limit.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset of the first item on this page. Pages past `u64` range are
    /// a validation error.
    pub fn offset(&self) -> Result<u64, AppError> {
        (self.number - 1)
            .checked_mul(self.size)
            .ok_or_else(|| AppError::Validation(format!("page {} is out of range", self.number)))
    }
}

/// Resolve a per-author recipe preview size, capped like page sizes.
pub fn preview_limit(requested: Option<u64>, default_limit: u64) -> u64 {
    requested.unwrap_or(default_limit).min(MAX_PAGE_SIZE)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Return the first value that appears more than once.
pub fn first_duplicate<T, I>(items: I) -> Option<T>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items.into_iter().find(|item| !seen.insert(*item))
}

/// Parse a boolean query flag. Accepts `1`/`0`/`true`/`false`.
pub fn parse_flag(value: Option<&str>, name: &str) -> Result<bool, AppError> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(other) => Err(AppError::Validation(format!(
            "{name} must be 0, 1, true or false, got '{other}'"
        ))),
    }
}
