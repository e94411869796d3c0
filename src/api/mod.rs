//! API handlers for Lendshelf REST endpoints

pub mod admin;
pub mod auth;
pub mod borrows;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod openapi;
pub mod public;
pub mod settings;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{error::AppError, models::Account, AppState};

/// Extractor for the signed-in, approved account behind a bearer token
pub struct AuthenticatedUser(pub Account);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Authentication("Missing or invalid authorization header".to_string())
                })?;

        let account = state.services.auth.account_from_token(bearer.token()).await?;
        Ok(AuthenticatedUser(account))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.media.max_upload_bytes;
    let media_root = state.services.media.root().to_path_buf();

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Dashboard and settings
        .route("/dashboard", get(dashboard::dashboard))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/settings/regenerate-token", post(settings::regenerate_token))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/:id/toggle-availability", post(items::toggle_availability))
        .route(
            "/items/:id/image",
            put(items::upload_image)
                .delete(items::clear_image)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/items/:id/borrows", get(items::item_borrows))
        // Borrow workflow
        .route("/borrows/requests", get(borrows::list_requests))
        .route("/borrows/lendings", get(borrows::list_lendings))
        .route("/borrows/:id/approve", post(borrows::approve))
        .route("/borrows/:id/deny", post(borrows::deny))
        .route("/borrows/:id/mark-lent", post(borrows::mark_lent))
        .route("/borrows/:id/mark-returned", post(borrows::mark_returned))
        // Public lending pages (no login)
        .route("/lend/:token", get(public::catalog))
        .route("/lend/:token/items/:item_id", get(public::item_detail))
        .route("/lend/:token/items/:item_id/request", post(public::request_borrow))
        // Administration
        .route("/admin/accounts", get(admin::list_accounts).post(admin::provision_account))
        .route("/admin/accounts/:id/approve", post(admin::approve_account))
        .route("/admin/accounts/:id/unapprove", post(admin::unapprove_account))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .nest_service("/media", ServeDir::new(media_root))
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
