//! Registration, login and session endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::account::{Account, AccountShort, RegisterAccount},
};

use super::AuthenticatedUser;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub handle: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub token_type: String,
    pub account: Account,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub account: AccountShort,
    pub message: String,
}

/// Sign up. The new account waits for an administrator's approval.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterAccount,
    responses(
        (status = 201, description = "Account created, pending approval", body = RegisterResponse),
        (status = 400, description = "Invalid handle or password, or handle taken")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterAccount>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let account = state.services.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: account.into(),
            message: "Account created. An administrator must approve it before you can sign in."
                .to_string(),
        }),
    ))
}

/// Sign in with handle and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account awaiting approval")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, account) = state
        .services
        .auth
        .authenticate(&request.handle, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        account,
    }))
}

/// End every session of the signed-in account
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<StatusCode> {
    state.services.auth.logout(&account).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current account
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed-in account", body = Account),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(account): AuthenticatedUser) -> Json<Account> {
    Json(account)
}
