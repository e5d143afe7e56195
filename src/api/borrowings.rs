//! Circulation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        borrowing::{BorrowingQuery, BorrowingView, IssueRequest, OverdueLoan, PayFineRequest},
        report::PageQuery,
        Borrowing, Page, PaginatedResponse,
    },
};

use super::AuthenticatedUser;

/// Lookup of the issued loan for a (member, book) pair
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct OpenLoanQuery {
    pub member_id: i32,
    pub book_id: i32,
}

/// Issue a book to a member
#[utoipa::path(
    post,
    path = "/borrowings/issue",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    request_body = IssueRequest,
    responses(
        (status = 201, description = "Book issued", body = Borrowing),
        (status = 404, description = "Member or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Issue rejected by circulation rules", body = crate::error::ErrorResponse),
        (status = 503, description = "Store temporarily unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<IssueRequest>,
) -> AppResult<(StatusCode, Json<Borrowing>)> {
    claims.require_librarian()?;

    let borrowing = state
        .services
        .circulation
        .issue(request.member_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// Return an issued book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Book returned, fine finalized", body = Borrowing),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrowing>> {
    claims.require_librarian()?;

    let borrowing = state.services.circulation.return_loan(id).await?;
    Ok(Json(borrowing))
}

/// Renew an issued book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/renew",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Due date extended", body = Borrowing),
        (status = 403, description = "Borrowing belongs to another member"),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Renewal rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrowing>> {
    let requester = claims.requester()?;

    let borrowing = state.services.circulation.renew(id, requester).await?;
    Ok(Json(borrowing))
}

/// Pay all or part of a borrowing's fine
#[utoipa::path(
    post,
    path = "/borrowings/{id}/pay-fine",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    request_body = PayFineRequest,
    responses(
        (status = 200, description = "Payment recorded", body = Borrowing),
        (status = 400, description = "Invalid amount", body = crate::error::ErrorResponse),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Amount exceeds fine", body = crate::error::ErrorResponse)
    )
)]
pub async fn pay_fine(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<PayFineRequest>,
) -> AppResult<Json<Borrowing>> {
    let requester = claims.requester()?;

    let borrowing = state
        .services
        .circulation
        .pay_fine(id, request.amount, requester)
        .await?;
    Ok(Json(borrowing))
}

/// Get a borrowing
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrowing ID")),
    responses(
        (status = 200, description = "Borrowing details", body = BorrowingView),
        (status = 404, description = "Borrowing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingView>> {
    let requester = claims.requester()?;

    let borrowing = state.services.circulation.get(id, requester).await?;
    Ok(Json(borrowing))
}

/// List borrowings; members see only their own
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(BorrowingQuery),
    responses(
        (status = 200, description = "Page of borrowings", body = PaginatedResponse<BorrowingView>)
    )
)]
pub async fn list_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowingQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowingView>>> {
    let requester = claims.requester()?;

    let borrowings = state.services.circulation.list(query, requester).await?;
    Ok(Json(borrowings))
}

/// Overdue loans with projected fines
#[utoipa::path(
    get,
    path = "/borrowings/overdue",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Overdue loans, oldest due first", body = PaginatedResponse<OverdueLoan>)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<OverdueLoan>>> {
    claims.require_librarian()?;

    let page = Page::new(query.page, query.limit)?;
    let overdue = state.services.circulation.overdue(page).await?;
    Ok(Json(overdue))
}

/// Find the issued loan for a member and book, if any
///
/// Used to check whether an issue request that failed ambiguously went through before retrying it.
#[utoipa::path(
    get,
    path = "/borrowings/open",
    tag = "borrowings",
    security(("bearer_auth" = [])),
    params(OpenLoanQuery),
    responses(
        (status = 200, description = "The open loan, or null when there is none", body = Borrowing)
    )
)]
pub async fn find_open_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<OpenLoanQuery>,
) -> AppResult<Json<Option<Borrowing>>> {
    claims.require_member_access(query.member_id)?;

    let loan = state
        .services
        .circulation
        .find_open_loan(query.member_id, query.book_id)
        .await?;
    Ok(Json(loan))
}
