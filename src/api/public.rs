//! Public lending pages. No authentication; the token in the path is the key.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrow::{Borrow, BorrowRequest},
    visibility::{PublicCatalog, PublicItemDetail},
};

/// A lender's catalog as visitors see it
#[utoipa::path(
    get,
    path = "/lend/{token}",
    tag = "public",
    params(
        ("token" = String, Path, description = "Lending token")
    ),
    responses(
        (status = 200, description = "Public catalog", body = PublicCatalog),
        (status = 404, description = "Lending page not found")
    )
)]
pub async fn catalog(
    State(state): State<crate::AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<PublicCatalog>> {
    let catalog = state.services.public.catalog(&token).await?;
    Ok(Json(catalog))
}

/// One item of a lender's catalog
#[utoipa::path(
    get,
    path = "/lend/{token}/items/{item_id}",
    tag = "public",
    params(
        ("token" = String, Path, description = "Lending token"),
        ("item_id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Public item page", body = PublicItemDetail),
        (status = 404, description = "Lending page or item not found")
    )
)]
pub async fn item_detail(
    State(state): State<crate::AppState>,
    Path((token, item_id)): Path<(String, i64)>,
) -> AppResult<Json<PublicItemDetail>> {
    let detail = state.services.public.item_detail(&token, item_id).await?;
    Ok(Json(detail))
}

/// Ask to borrow an item
#[utoipa::path(
    post,
    path = "/lend/{token}/items/{item_id}/request",
    tag = "public",
    params(
        ("token" = String, Path, description = "Lending token"),
        ("item_id" = i64, Path, description = "Item ID")
    ),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Request recorded", body = Borrow),
        (status = 400, description = "Missing name or item not available"),
        (status = 404, description = "Lending page or item not found")
    )
)]
pub async fn request_borrow(
    State(state): State<crate::AppState>,
    Path((token, item_id)): Path<(String, i64)>,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<Borrow>)> {
    let borrow = state
        .services
        .public
        .request_borrow(&token, item_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(borrow)))
}
