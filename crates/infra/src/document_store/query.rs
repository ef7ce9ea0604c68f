//! Listing helpers: pagination and case-insensitive text search.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::r#trait::StoreError;

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;

/// 1-based page request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    DEFAULT_PAGE
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Normalize nonsensical values (page/limit of zero) to the defaults.
    fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: if self.limit == 0 { DEFAULT_LIMIT } else { self.limit },
        }
    }
}

/// One page of results plus the pagination envelope callers echo back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

/// Slice an already-filtered result set into one page.
pub fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let Pagination { page, limit } = pagination.normalized();
    let total = items.len();
    let total_pages = total.div_ceil(limit);

    let items = items
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Page {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

/// Case-insensitive regex search over declared text fields.
///
/// The empty pattern matches everything, mirroring how an absent `search`
/// query parameter behaves.
#[derive(Debug, Clone)]
pub struct TextSearch {
    regex: Regex,
}

impl TextSearch {
    pub fn new(pattern: &str) -> Result<Self, StoreError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::InvalidQuery(format!("search pattern: {e}")))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, field: &str) -> bool {
        self.regex.is_match(field)
    }

    /// True when any of the given fields matches (`None` fields are skipped).
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = Option<&'a str>>) -> bool {
        fields
            .into_iter()
            .flatten()
            .any(|field| self.matches(field))
    }
}
