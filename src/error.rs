//! Error types for the Lexora server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum Entity {
    Member,
    Book,
    Borrowing,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Entity::Member => "Member",
            Entity::Book => "Book",
            Entity::Borrowing => "Borrowing",
        };
        write!(f, "{}", label)
    }
}

/// Business rules a circulation or administration request can violate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    MemberSuspended,
    MemberHasOverdue,
    MemberLimitExceeded,
    BookUnavailable,
    DuplicateLoan,
    AlreadyReturned,
    NotIssued,
    RenewalLimitExceeded,
    BookReserved,
    CannotRenewOverdue,
    AmountExceedsFine,
    MemberHasOpenLoans,
    MemberHasOutstandingFines,
    BookHasOpenLoans,
    CopiesBelowIssued,
}

impl RejectReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MemberSuspended => "MEMBER_SUSPENDED",
            RejectReason::MemberHasOverdue => "MEMBER_HAS_OVERDUE",
            RejectReason::MemberLimitExceeded => "MEMBER_LIMIT_EXCEEDED",
            RejectReason::BookUnavailable => "BOOK_UNAVAILABLE",
            RejectReason::DuplicateLoan => "DUPLICATE_LOAN",
            RejectReason::AlreadyReturned => "ALREADY_RETURNED",
            RejectReason::NotIssued => "NOT_ISSUED",
            RejectReason::RenewalLimitExceeded => "RENEWAL_LIMIT_EXCEEDED",
            RejectReason::BookReserved => "BOOK_RESERVED",
            RejectReason::CannotRenewOverdue => "CANNOT_RENEW_OVERDUE",
            RejectReason::AmountExceedsFine => "AMOUNT_EXCEEDS_FINE",
            RejectReason::MemberHasOpenLoans => "MEMBER_HAS_OPEN_LOANS",
            RejectReason::MemberHasOutstandingFines => "MEMBER_HAS_OUTSTANDING_FINES",
            RejectReason::BookHasOpenLoans => "BOOK_HAS_OPEN_LOANS",
            RejectReason::CopiesBelowIssued => "COPIES_BELOW_ISSUED",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::MemberSuspended => "Member account is suspended",
            RejectReason::MemberHasOverdue => "Member has overdue books and cannot borrow new books",
            RejectReason::MemberLimitExceeded => "Member has reached the maximum borrowing limit",
            RejectReason::BookUnavailable => "Book is not available for borrowing",
            RejectReason::DuplicateLoan => "Member already has this book issued",
            RejectReason::AlreadyReturned => "Book is already returned",
            RejectReason::NotIssued => "Only issued books can be renewed",
            RejectReason::RenewalLimitExceeded => "Book has reached maximum renewal limit",
            RejectReason::BookReserved => "Book is reserved by another member and cannot be renewed",
            RejectReason::CannotRenewOverdue => "Overdue books must be returned, not renewed",
            RejectReason::AmountExceedsFine => "Payment amount cannot exceed fine amount",
            RejectReason::MemberHasOpenLoans => "Cannot delete member with active loans",
            RejectReason::MemberHasOutstandingFines => "Cannot delete member with outstanding fines",
            RejectReason::BookHasOpenLoans => "Cannot delete book with active loans",
            RejectReason::CopiesBelowIssued => "Total copies cannot drop below the number of issued copies",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} {1} not found")]
    NotFound(Entity, i32),

    #[error("Business rule violation: {0}")]
    Rejected(RejectReason),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error kind as exposed to API clients
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(..) => "NotFound",
            AppError::Rejected(_) => "Rejected",
            AppError::Conflict(_) => "Conflict",
            AppError::Transient(_) => "Transient",
            AppError::Validation(_) | AppError::BadRequest(_) => "ValidationError",
            AppError::Authentication(_) => "Unauthorized",
            AppError::Authorization(_) => "Forbidden",
            AppError::Database(_) | AppError::Internal(_) => "InternalError",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(Entity::Member, _) => "MEMBER_NOT_FOUND",
            AppError::NotFound(Entity::Book, _) => "BOOK_NOT_FOUND",
            AppError::NotFound(Entity::Borrowing, _) => "BORROWING_NOT_FOUND",
            AppError::Rejected(reason) => reason.code(),
            AppError::Conflict(_) => "DUPLICATE",
            AppError::Transient(_) => "STORE_UNAVAILABLE",
            AppError::Validation(_) | AppError::BadRequest(_) => "BAD_VALUE",
            AppError::Authentication(_) | AppError::Authorization(_) => "NOT_AUTHORIZED",
            AppError::Database(_) => "DB_FAILURE",
            AppError::Internal(_) => "FAILURE",
        }
    }

    /// Whether the caller may safely retry the operation
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transient(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_transient_sqlx(&err) {
            AppError::Transient(err.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Serialization failures, deadlocks, lock and statement timeouts, pool exhaustion
fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some("40001") | Some("40P01") | Some("55P03") | Some("57014")
        ),
        _ => false,
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(..) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Rejected(reason) => (StatusCode::CONFLICT, reason.message().to_string()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Transient(msg) => {
                tracing::warn!("Transient store failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: self.kind().to_string(),
            code: self.code().to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
