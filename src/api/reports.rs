//! Reporting endpoints (librarians only)

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        report::{
            ActivityQuery, FineQuery, FineRecord, InventoryQuery, InventoryReport, LibraryStats,
            MemberActivity, MemberFines, OverdueItem, PageQuery, PeriodQuery, PopularBook,
        },
        PaginatedResponse,
    },
};

use super::AuthenticatedUser;

/// Library dashboard statistics
#[utoipa::path(
    get,
    path = "/reports/stats",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = LibraryStats),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<LibraryStats>> {
    claims.require_librarian()?;

    let stats = state.services.reports.stats().await?;
    Ok(Json(stats))
}

/// Most borrowed books in a period
#[utoipa::path(
    get,
    path = "/reports/popular-books",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(PeriodQuery),
    responses(
        (status = 200, description = "Books by borrow count", body = PaginatedResponse<PopularBook>)
    )
)]
pub async fn popular_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<PaginatedResponse<PopularBook>>> {
    claims.require_librarian()?;

    let report = state.services.reports.popular_books(query).await?;
    Ok(Json(report))
}

/// Member borrowing activity in a period
#[utoipa::path(
    get,
    path = "/reports/member-activity",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Members by activity", body = PaginatedResponse<MemberActivity>)
    )
)]
pub async fn member_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<MemberActivity>>> {
    claims.require_librarian()?;

    let report = state.services.reports.member_activity(query).await?;
    Ok(Json(report))
}

/// Overdue loans with member contact details
#[utoipa::path(
    get,
    path = "/reports/overdue",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Overdue loans, longest overdue first", body = PaginatedResponse<OverdueItem>)
    )
)]
pub async fn overdue_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<OverdueItem>>> {
    claims.require_librarian()?;

    let report = state.services.reports.overdue(query).await?;
    Ok(Json(report))
}

/// Fines charged on returns
#[utoipa::path(
    get,
    path = "/reports/fines",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(FineQuery),
    responses(
        (status = 200, description = "Fine records", body = PaginatedResponse<FineRecord>)
    )
)]
pub async fn fines_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<FineQuery>,
) -> AppResult<Json<PaginatedResponse<FineRecord>>> {
    claims.require_librarian()?;

    let report = state.services.reports.fines(query).await?;
    Ok(Json(report))
}

/// Stock levels per title
#[utoipa::path(
    get,
    path = "/reports/inventory",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory with summary", body = InventoryReport),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn inventory_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<InventoryReport>> {
    claims.require_librarian()?;

    let report = state.services.reports.inventory(query).await?;
    Ok(Json(report))
}

/// Outstanding fines of one member
#[utoipa::path(
    get,
    path = "/reports/member-fines/{member_id}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("member_id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Fine statement", body = MemberFines),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Member not found")
    )
)]
pub async fn member_fines(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(member_id): Path<i32>,
) -> AppResult<Json<MemberFines>> {
    claims.require_librarian()?;

    let report = state.services.reports.member_fines(member_id).await?;
    Ok(Json(report))
}
