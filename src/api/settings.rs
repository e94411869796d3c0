//! Lending page settings: visibility toggles and the secret token

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::account::{Account, VisibilitySettings},
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct SettingsResponse {
    pub visibility: VisibilitySettings,
    pub lending_token: String,
    pub lending_path: String,
}

impl From<Account> for SettingsResponse {
    fn from(account: Account) -> Self {
        Self {
            lending_path: account.lending_path(),
            visibility: account.visibility,
            lending_token: account.lending_token,
        }
    }
}

/// Current lending page settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Lending page settings", body = SettingsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_settings(AuthenticatedUser(account): AuthenticatedUser) -> Json<SettingsResponse> {
    Json(account.into())
}

/// Replace the visibility toggles
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = VisibilitySettings,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Json(visibility): Json<VisibilitySettings>,
) -> AppResult<Json<SettingsResponse>> {
    let updated = state
        .services
        .accounts
        .update_visibility(&account, visibility)
        .await?;
    Ok(Json(updated.into()))
}

/// Issue a new lending token. The previous lending page URL stops working.
#[utoipa::path(
    post,
    path = "/settings/regenerate-token",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "New token issued", body = SettingsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn regenerate_token(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<SettingsResponse>> {
    let updated = state.services.accounts.regenerate_token(&account).await?;
    Ok(Json(updated.into()))
}
