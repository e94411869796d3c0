//! Owner endpoints for the borrow workflow

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::borrow::BorrowRecord};

use super::AuthenticatedUser;

/// Requests awaiting the owner: requested and approved
#[utoipa::path(
    get,
    path = "/borrows/requests",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Open requests, newest first", body = Vec<BorrowRecord>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let records = state.services.borrows.open_requests(&account).await?;
    Ok(Json(records))
}

/// Items currently lent out
#[utoipa::path(
    get,
    path = "/borrows/lendings",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current lendings", body = Vec<BorrowRecord>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_lendings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let records = state.services.borrows.current_lendings(&account).await?;
    Ok(Json(records))
}

/// Approve a requested borrow
#[utoipa::path(
    post,
    path = "/borrows/{id}/approve",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Borrow approved", body = BorrowRecord),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Borrow is not in the requested state")
    )
)]
pub async fn approve(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.borrows.approve(&account, id).await?;
    Ok(Json(record))
}

/// Deny a requested borrow
#[utoipa::path(
    post,
    path = "/borrows/{id}/deny",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Borrow denied", body = BorrowRecord),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Borrow is not in the requested state")
    )
)]
pub async fn deny(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.borrows.deny(&account, id).await?;
    Ok(Json(record))
}

/// Record the hand-over of an approved borrow
#[utoipa::path(
    post,
    path = "/borrows/{id}/mark-lent",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Item lent out", body = BorrowRecord),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Borrow is not approved, or the item is already lent out")
    )
)]
pub async fn mark_lent(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.borrows.mark_lent(&account, id).await?;
    Ok(Json(record))
}

/// Record the return of a lent item
#[utoipa::path(
    post,
    path = "/borrows/{id}/mark-returned",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Borrow ID")
    ),
    responses(
        (status = 200, description = "Item returned", body = BorrowRecord),
        (status = 404, description = "Borrow not found"),
        (status = 409, description = "Borrow is not lent out")
    )
)]
pub async fn mark_returned(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BorrowRecord>> {
    let record = state.services.borrows.mark_returned(&account, id).await?;
    Ok(Json(record))
}
