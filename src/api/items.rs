//! Owner endpoints for the item catalog

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    models::{
        borrow::Borrow,
        item::{Item, ItemInput, OwnedItem},
    },
};

use super::AuthenticatedUser;

/// Form field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

/// List the signed-in lender's items, newest first
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Owned items with loan state", body = Vec<OwnedItem>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
) -> AppResult<Json<Vec<OwnedItem>>> {
    let items = state.services.catalog.list_items(&account).await?;
    Ok(Json(items))
}

/// Get one owned item
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = OwnedItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OwnedItem>> {
    let item = state.services.catalog.get_item(&account, id).await?;
    Ok(Json(item))
}

/// Add an item to the catalog
#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    request_body = ItemInput,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Json(input): Json<ItemInput>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let created = state.services.catalog.create_item(&account, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edit an item's descriptive fields
#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = ItemInput,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(input): Json<ItemInput>,
) -> AppResult<Json<Item>> {
    let updated = state.services.catalog.update_item(&account, id, input).await?;
    Ok(Json(updated))
}

/// Delete an item with its whole borrow history
#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_item(&account, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip whether the item accepts new borrow requests
#[utoipa::path(
    post,
    path = "/items/{id}/toggle-availability",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Availability flipped", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn toggle_availability(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.toggle_availability(&account, id).await?;
    Ok(Json(item))
}

/// Upload the item's image (multipart field `image`)
#[utoipa::path(
    put,
    path = "/items/{id}/image",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Image stored", body = Item),
        (status = 400, description = "Missing or unsupported image"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn upload_image(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<Json<Item>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded image is empty".to_string()));
        }

        let item = state
            .services
            .catalog
            .set_image(&account, id, file_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;
        return Ok(Json(item));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{}'",
        IMAGE_FIELD
    )))
}

/// Remove the item's image
#[utoipa::path(
    delete,
    path = "/items/{id}/image",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Image removed", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn clear_image(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Item>> {
    let item = state.services.catalog.clear_image(&account, id).await?;
    Ok(Json(item))
}

/// Every borrow of an item, in all states, newest request first
#[utoipa::path(
    get,
    path = "/items/{id}/borrows",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Borrows of the item", body = Vec<Borrow>),
        (status = 404, description = "Item not found")
    )
)]
pub async fn item_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(account): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Borrow>>> {
    let item = state.services.catalog.owned_item(&account, id).await?;
    let borrows = state.services.borrows.item_history(&item).await?;
    Ok(Json(borrows))
}
