//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, borrows, dashboard, health, items, public, settings};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lendshelf API",
        version = "0.3.0",
        description = "Lend your things to friends through a private lending page",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        // Dashboard and settings
        dashboard::dashboard,
        settings::get_settings,
        settings::update_settings,
        settings::regenerate_token,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::toggle_availability,
        items::upload_image,
        items::clear_image,
        items::item_borrows,
        // Borrows
        borrows::list_requests,
        borrows::list_lendings,
        borrows::approve,
        borrows::deny,
        borrows::mark_lent,
        borrows::mark_returned,
        // Public lending pages
        public::catalog,
        public::item_detail,
        public::request_borrow,
        // Admin
        admin::list_accounts,
        admin::provision_account,
        admin::approve_account,
        admin::unapprove_account,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterResponse,
            crate::models::account::Account,
            crate::models::account::AccountShort,
            crate::models::account::RegisterAccount,
            crate::models::account::ProvisionAccount,
            crate::models::account::VisibilitySettings,
            // Dashboard and settings
            dashboard::DashboardSummary,
            crate::services::borrows::BorrowCounts,
            settings::SettingsResponse,
            // Items
            crate::models::item::Item,
            crate::models::item::ItemInput,
            crate::models::item::OwnedItem,
            // Borrows
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowStatus,
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowRequest,
            // Public
            crate::visibility::PublicCatalog,
            crate::visibility::PublicItem,
            crate::visibility::PublicItemDetail,
            crate::visibility::PublicHistoryEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and sessions"),
        (name = "dashboard", description = "Lender overview"),
        (name = "settings", description = "Lending page settings"),
        (name = "items", description = "Catalog item management"),
        (name = "borrows", description = "Borrow workflow"),
        (name = "public", description = "Public lending pages"),
        (name = "admin", description = "Account administration")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
