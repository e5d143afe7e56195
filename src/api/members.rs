//! Member endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        borrowing::BorrowingView,
        member::{MemberDetails, MemberRequest, MemberStats},
        Member, MemberQuery, PaginatedResponse,
    },
};

use super::AuthenticatedUser;

/// List members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    params(MemberQuery),
    responses(
        (status = 200, description = "Page of members", body = PaginatedResponse<Member>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn list_members(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MemberQuery>,
) -> AppResult<Json<PaginatedResponse<Member>>> {
    claims.require_librarian()?;

    let members = state.services.members.list(query).await?;
    Ok(Json(members))
}

/// Get member details with loan and fine totals
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = MemberDetails),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MemberDetails>> {
    claims.require_member_access(id)?;

    let member = state.services.members.get(id).await?;
    Ok(Json(member))
}

/// Register a member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    security(("bearer_auth" = [])),
    request_body = MemberRequest,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input or duplicate email", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<MemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    claims.require_librarian()?;

    let created = state.services.members.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update member contact details (librarians, or the member themselves)
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 400, description = "Invalid input or duplicate email", body = crate::error::ErrorResponse),
        (status = 403, description = "Members may only update their own details", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<MemberRequest>,
) -> AppResult<Json<Member>> {
    claims.require_member_access(id)?;

    let updated = state.services.members.update(id, request).await?;
    Ok(Json(updated))
}

/// Delete a member without open loans or unpaid fines
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Member has active loans or outstanding fines", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;

    state.services.members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Suspend a member
#[utoipa::path(
    post,
    path = "/members/{id}/suspend",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member suspended", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn suspend_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Member>> {
    claims.require_librarian()?;

    let member = state.services.members.suspend(id).await?;
    Ok(Json(member))
}

/// Reactivate a suspended member
#[utoipa::path(
    post,
    path = "/members/{id}/activate",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member activated", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn activate_member(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Member>> {
    claims.require_librarian()?;

    let member = state.services.members.activate(id).await?;
    Ok(Json(member))
}

/// Current loans of a member
#[utoipa::path(
    get,
    path = "/members/{id}/loans",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Issued borrowings, earliest due first", body = Vec<BorrowingView>),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn member_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BorrowingView>>> {
    claims.require_member_access(id)?;

    let loans = state.services.circulation.member_loans(id).await?;
    Ok(Json(loans))
}

/// Borrowing statistics of a member
#[utoipa::path(
    get,
    path = "/members/{id}/stats",
    tag = "members",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member statistics", body = MemberStats),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn member_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MemberStats>> {
    claims.require_member_access(id)?;

    let stats = state.services.members.stats(id).await?;
    Ok(Json(stats))
}
