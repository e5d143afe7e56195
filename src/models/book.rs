//! Book (catalog entry) model and related types

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan
    pub fn issued_copies(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Book creation payload, as handed to the store
#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
}

/// Create or update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(length(min = 1, max = 20, message = "ISBN must be 1-20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author must be 1-200 characters"))]
    pub author: String,
    #[validate(length(max = 100, message = "Category must be less than 100 characters"))]
    pub category: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 1, max = 9999, message = "Total copies must be between 1 and 9999"))]
    pub total_copies: i32,
}

impl BookRequest {
    /// Run field validation plus the date-dependent publication year check
    pub fn check(&self, today: NaiveDate) -> AppResult<()> {
        self.validate()?;

        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if self.author.trim().is_empty() {
            return Err(AppError::Validation("Author is required".to_string()));
        }
        if let Some(year) = self.publication_year {
            if year < 1000 || year > today.year() + 1 {
                return Err(AppError::Validation(
                    "Published year must be a valid year".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn into_new_book(self) -> NewBook {
        NewBook {
            isbn: non_blank(self.isbn),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            category: non_blank(self.category),
            publication_year: self.publication_year,
            total_copies: self.total_copies,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Book search query
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive match on title or author
    pub search: Option<String>,
    /// Exact category (case-insensitive)
    pub category: Option<String>,
    /// Only books with at least one available copy
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl BookQuery {
    /// In-memory evaluation of the filter, ordered like the SQL variant
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(ref search) = self.search {
            let needle = search.to_uppercase();
            if !book.title.to_uppercase().contains(&needle)
                && !book.author.to_uppercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            match book.category {
                Some(ref c) if c.eq_ignore_ascii_case(category) => {}
                _ => return false,
            }
        }
        if self.available == Some(true) && book.available_copies <= 0 {
            return false;
        }
        true
    }
}
