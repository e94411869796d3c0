//! Account administration (admin only)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::account::{AccountQuery, AccountShort, ProvisionAccount},
};

use super::AuthenticatedUser;

/// List accounts, optionally only those awaiting approval
#[utoipa::path(
    get,
    path = "/admin/accounts",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(AccountQuery),
    responses(
        (status = 200, description = "Accounts", body = Vec<AccountShort>),
        (status = 403, description = "Administrator only")
    )
)]
pub async fn list_accounts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Query(query): Query<AccountQuery>,
) -> AppResult<Json<Vec<AccountShort>>> {
    let accounts = state
        .services
        .accounts
        .list(&admin, query.pending.unwrap_or(false))
        .await?;
    Ok(Json(accounts))
}

/// Create an already-approved account
#[utoipa::path(
    post,
    path = "/admin/accounts",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = ProvisionAccount,
    responses(
        (status = 201, description = "Account created", body = AccountShort),
        (status = 400, description = "Invalid handle or password"),
        (status = 403, description = "Administrator only")
    )
)]
pub async fn provision_account(
    State(state): State<crate::AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Json(request): Json<ProvisionAccount>,
) -> AppResult<(StatusCode, Json<AccountShort>)> {
    admin.require_admin()?;

    let account = state.services.auth.provision(request).await?;
    tracing::info!(admin_id = admin.id, account_id = account.id, "Account provisioned");
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Grant dashboard access
#[utoipa::path(
    post,
    path = "/admin/accounts/{id}/approve",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account approved", body = AccountShort),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn approve_account(
    State(state): State<crate::AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AccountShort>> {
    let account = state.services.accounts.set_approved(&admin, id, true).await?;
    Ok(Json(account))
}

/// Withdraw dashboard access. The lending page disappears with it.
#[utoipa::path(
    post,
    path = "/admin/accounts/{id}/unapprove",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account unapproved", body = AccountShort),
        (status = 403, description = "Administrator only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn unapprove_account(
    State(state): State<crate::AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<AccountShort>> {
    let account = state.services.accounts.set_approved(&admin, id, false).await?;
    Ok(Json(account))
}
