//! Report projections

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{
    borrowing::BorrowingStatus,
    member::{Member, MemberStatus},
};

/// Reporting window, counted back from today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Period {
    /// First issue date included in the window
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Week => Some(today - chrono::Duration::days(7)),
            Period::Month => Some(today - chrono::Duration::days(30)),
            Period::Year => today.checked_sub_months(chrono::Months::new(12)),
            Period::All => None,
        }
    }
}

/// Fine report filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FineStatus {
    Paid,
    #[default]
    Unpaid,
    All,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub book_count: i64,
    pub total_copies: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StatusCount {
    pub status: MemberStatus,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MonthlyCount {
    /// Month as YYYY-MM
    pub month: String,
    pub borrowings: i64,
}

/// Library dashboard statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryStats {
    pub total_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub total_members: i64,
    pub active_members: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub outstanding_fines: Decimal,
    pub category_distribution: Vec<CategoryCount>,
    pub member_status_distribution: Vec<StatusCount>,
    pub borrowing_trends: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PopularBook {
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub borrow_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MemberActivity {
    pub member_id: i32,
    pub full_name: String,
    pub email: Option<String>,
    pub status: MemberStatus,
    pub join_date: NaiveDate,
    pub total_borrows: i64,
    pub active_loans: i64,
    pub total_fines: Decimal,
    pub last_borrow_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct OverdueItem {
    pub borrow_id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub member_email: Option<String>,
    pub member_phone: Option<String>,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub accrued_fine: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FineRecord {
    pub borrow_id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub book_id: i32,
    pub book_title: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    /// Fine charged when the book came back
    pub assessed_fine: Decimal,
    /// Part of the fine still unpaid
    pub fine_amount: Decimal,
    pub paid: bool,
}

/// Inventory availability filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// At least one copy on the shelf
    Available,
    /// Every copy out on loan
    Unavailable,
    #[default]
    All,
}

/// Per-title stock line
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct InventoryItem {
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub issued_copies: i32,
    /// Share of copies on the shelf, 0-100 with two decimals
    pub availability_percentage: Decimal,
}

/// Stock totals over every title matching the inventory filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct InventorySummary {
    pub total_titles: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    pub issued_copies: i64,
    pub out_of_stock: i64,
}

/// Inventory page with its summary
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryReport {
    pub summary: InventorySummary,
    pub inventory: Vec<InventoryItem>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Fined borrowing in a member's fine statement
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct FineBreakdown {
    pub borrow_id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub fine_amount: Decimal,
    pub status: BorrowingStatus,
}

/// Outstanding fines of one member
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberFines {
    pub member: Member,
    pub outstanding_fines: Decimal,
    pub fine_breakdown: Vec<FineBreakdown>,
}

/// Query for reports with a period window
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Period,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query for the member activity report
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct ActivityQuery {
    #[serde(default)]
    pub period: Period,
    pub status: Option<MemberStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query for the fine collection report
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct FineQuery {
    #[serde(default)]
    pub period: Period,
    pub status: Option<FineStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query for plain paginated lists
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Query for the inventory report
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct InventoryQuery {
    /// Exact category (case-insensitive)
    pub category: Option<String>,
    pub availability: Option<Availability>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
