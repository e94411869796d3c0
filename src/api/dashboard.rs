//! Lender dashboard

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, services::borrows::BorrowCounts};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct DashboardSummary {
    pub handle: String,
    /// Path of the public lending page to share with friends
    pub lending_path: String,
    pub item_count: usize,
    pub available_count: usize,
    pub borrows: BorrowCounts,
}

/// Overview of the lender's catalog and pending work
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<DashboardSummary>> {
    let items = state.services.catalog.list_items(&account).await?;
    let borrows = state.services.borrows.counts(&account).await?;

    Ok(Json(DashboardSummary {
        lending_path: account.lending_path(),
        item_count: items.len(),
        available_count: items.iter().filter(|owned| owned.item.is_available).count(),
        handle: account.handle,
        borrows,
    }))
}
