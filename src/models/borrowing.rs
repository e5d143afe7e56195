//! Borrowing (loan) model and related types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

/// Persisted borrowing state. Overdue is derived from the due date, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowingStatus {
    Issued,
    Returned,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Issued => "ISSUED",
            BorrowingStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ISSUED" => Ok(BorrowingStatus::Issued),
            "RETURNED" => Ok(BorrowingStatus::Returned),
            _ => Err(format!("Invalid borrowing status: {}", s)),
        }
    }
}

// SQLx conversion for BorrowingStatus (stored as text)
impl sqlx::Type<Postgres> for BorrowingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BorrowingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Borrowing model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub member_id: i32,
    pub book_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    /// Fine charged at return, kept as charged even after payments
    pub assessed_fine: Decimal,
    /// Unpaid part of the fine
    pub fine_amount: Decimal,
    pub status: BorrowingStatus,
    pub renewal_count: i32,
}

impl Borrowing {
    pub fn is_issued(&self) -> bool {
        self.status == BorrowingStatus::Issued
    }

    /// Issued and past its due date as of `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_issued() && self.due_date < today
    }

    /// Whole days past due as of `date`, zero when not late
    pub fn days_late(&self, date: NaiveDate) -> i64 {
        (date - self.due_date).num_days().max(0)
    }
}

/// Borrowing creation payload, as handed to the store
#[derive(Debug, Clone)]
pub struct NewBorrowing {
    pub member_id: i32,
    pub book_id: i32,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Borrowing as returned to API clients, with the derived overdue flag
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingView {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub is_overdue: bool,
    pub days_overdue: i64,
}

impl BorrowingView {
    pub fn new(borrowing: Borrowing, today: NaiveDate) -> Self {
        let is_overdue = borrowing.is_overdue(today);
        let days_overdue = if is_overdue { borrowing.days_late(today) } else { 0 };
        Self {
            borrowing,
            is_overdue,
            days_overdue,
        }
    }
}

/// Issued loan past its due date, with the fine it would incur if returned today
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueLoan {
    #[serde(flatten)]
    pub borrowing: Borrowing,
    pub days_overdue: i64,
    pub accrued_fine: Decimal,
}

/// Store-level borrowing filter
#[derive(Debug, Default, Clone)]
pub struct BorrowingFilter {
    pub status: Option<BorrowingStatus>,
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
    /// Restrict to issued loans due strictly before this date
    pub overdue_as_of: Option<NaiveDate>,
}

impl BorrowingFilter {
    pub fn matches(&self, borrowing: &Borrowing) -> bool {
        if let Some(status) = self.status {
            if borrowing.status != status {
                return false;
            }
        }
        if let Some(member_id) = self.member_id {
            if borrowing.member_id != member_id {
                return false;
            }
        }
        if let Some(book_id) = self.book_id {
            if borrowing.book_id != book_id {
                return false;
            }
        }
        if let Some(today) = self.overdue_as_of {
            if !borrowing.is_overdue(today) {
                return false;
            }
        }
        true
    }
}

/// Borrowing list query
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct BorrowingQuery {
    pub status: Option<BorrowingStatus>,
    pub member_id: Option<i32>,
    pub book_id: Option<i32>,
    /// Only issued loans past their due date
    pub overdue: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Issue book request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueRequest {
    pub member_id: i32,
    pub book_id: i32,
}

/// Fine payment request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PayFineRequest {
    /// Amount paid, in currency units
    #[schema(value_type = String, example = "2.50")]
    pub amount: Decimal,
}
