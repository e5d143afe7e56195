//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowings, health, members, reports};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lexora API",
        version = "1.0.0",
        description = "Library Circulation Management REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Members
        members::list_members,
        members::get_member,
        members::create_member,
        members::update_member,
        members::delete_member,
        members::suspend_member,
        members::activate_member,
        members::member_loans,
        members::member_stats,
        // Borrowings
        borrowings::issue_book,
        borrowings::return_book,
        borrowings::renew_book,
        borrowings::pay_fine,
        borrowings::get_borrowing,
        borrowings::list_borrowings,
        borrowings::list_overdue,
        borrowings::find_open_loan,
        // Reports
        reports::get_stats,
        reports::popular_books,
        reports::member_activity,
        reports::overdue_report,
        reports::fines_report,
        reports::inventory_report,
        reports::member_fines,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::book::BookQuery,
            // Members
            crate::models::member::Member,
            crate::models::member::MemberStatus,
            crate::models::member::MemberRequest,
            crate::models::member::MemberQuery,
            crate::models::member::MemberDetails,
            crate::models::member::MemberStats,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingStatus,
            crate::models::borrowing::BorrowingView,
            crate::models::borrowing::BorrowingQuery,
            crate::models::borrowing::OverdueLoan,
            crate::models::borrowing::IssueRequest,
            crate::models::borrowing::PayFineRequest,
            borrowings::OpenLoanQuery,
            // Reports
            crate::models::report::Period,
            crate::models::report::FineStatus,
            crate::models::report::LibraryStats,
            crate::models::report::CategoryCount,
            crate::models::report::StatusCount,
            crate::models::report::MonthlyCount,
            crate::models::report::PopularBook,
            crate::models::report::MemberActivity,
            crate::models::report::OverdueItem,
            crate::models::report::FineRecord,
            crate::models::report::Availability,
            crate::models::report::InventoryItem,
            crate::models::report::InventorySummary,
            crate::models::report::InventoryReport,
            crate::models::report::InventoryQuery,
            crate::models::report::FineBreakdown,
            crate::models::report::MemberFines,
            // Auth
            crate::models::auth::Role,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::RejectReason,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "members", description = "Member management"),
        (name = "borrowings", description = "Circulation: issue, return, renew, fines"),
        (name = "reports", description = "Reports and statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
