//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Supported languages for user-facing messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Spanish,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Spanish => "es",
            Language::English => "en",
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp to sane bounds: page >= 1, 1 <= per_page <= MAX_PER_PAGE
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u64) -> Self {
        let total_pages = (total_items as u32).div_ceil(pagination.per_page.max(1));
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamping() {
        let p = Pagination { page: 0, per_page: 500 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, Pagination::MAX_PER_PAGE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_offset() {
        let p = Pagination { page: 3, per_page: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn meta_rounds_pages_up() {
        let p = Pagination { page: 1, per_page: 20 };
        assert_eq!(PaginationMeta::new(&p, 0).total_pages, 0);
        assert_eq!(PaginationMeta::new(&p, 41).total_pages, 3);
        assert_eq!(PaginationMeta::new(&p, 40).total_pages, 2);
    }
}
