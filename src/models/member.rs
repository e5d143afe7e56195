//! Member model and related types

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Member account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    Active,
    Suspended,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "ACTIVE",
            MemberStatus::Suspended => "SUSPENDED",
        }
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(MemberStatus::Active),
            "SUSPENDED" => Ok(MemberStatus::Suspended),
            _ => Err(format!("Invalid member status: {}", s)),
        }
    }
}

// SQLx conversion for MemberStatus (stored as text)
impl sqlx::Type<Postgres> for MemberStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for MemberStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for MemberStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Member model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: MemberStatus,
    pub join_date: NaiveDate,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

/// Member creation payload, as handed to the store
#[derive(Debug, Clone)]
pub struct NewMember {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub join_date: NaiveDate,
}

/// Digits, spaces, dashes, plus signs and parentheses
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s\-\+\(\)]+$").expect("valid phone pattern")
});

/// Register or update member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemberRequest {
    #[validate(length(min = 1, max = 120, message = "Full name must be 1-120 characters"))]
    pub full_name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 120, message = "Email must be less than 120 characters")
    )]
    pub email: Option<String>,
    #[validate(
        length(max = 30, message = "Phone number must be less than 30 characters"),
        regex(path = *PHONE_REGEX, message = "Invalid phone number format")
    )]
    pub phone: Option<String>,
}

impl MemberRequest {
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;

        if self.full_name.trim().is_empty() {
            return Err(AppError::Validation("Full name is required".to_string()));
        }
        Ok(())
    }

    pub fn normalized_email(&self) -> Option<String> {
        self.email
            .as_ref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

/// Member search query
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
pub struct MemberQuery {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub status: Option<MemberStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl MemberQuery {
    pub fn matches(&self, member: &Member) -> bool {
        if let Some(ref search) = self.search {
            let needle = search.to_uppercase();
            let in_name = member.full_name.to_uppercase().contains(&needle);
            let in_email = member
                .email
                .as_ref()
                .map(|e| e.to_uppercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_email {
                return false;
            }
        }
        if let Some(status) = self.status {
            if member.status != status {
                return false;
            }
        }
        true
    }
}

/// Member with circulation figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDetails {
    #[serde(flatten)]
    pub member: Member,
    pub active_loans: i64,
    pub outstanding_fines: Decimal,
}

/// Per-member circulation statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberStats {
    pub active_loans: i64,
    pub total_borrows: i64,
    pub outstanding_fines: Decimal,
    pub overdue_books: i64,
}
