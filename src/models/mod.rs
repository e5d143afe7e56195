//! Data models for Lexora

pub mod auth;
pub mod book;
pub mod borrowing;
pub mod member;
pub mod report;

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use auth::{Claims, Role};
pub use book::{Book, BookQuery, NewBook};
pub use borrowing::{Borrowing, BorrowingFilter, BorrowingStatus, NewBorrowing};
pub use member::{Member, MemberQuery, MemberStatus, NewMember};

/// Default page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page number whose offset fits in an `i64` at any page size
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 1 {
            return Err(AppError::Validation("Page must be a positive integer".to_string()));
        }
        if page > MAX_PAGE {
            return Err(AppError::Validation(format!("Page must not exceed {}", MAX_PAGE)));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::Validation(format!(
                "Limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Slice an already ordered list down to this page
    pub fn apply<T>(&self, rows: Vec<T>) -> Vec<T> {
        rows.into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the current page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    /// Number of pages
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.limit,
            total_pages: (total + page.limit - 1) / page.limit,
        }
    }
}
