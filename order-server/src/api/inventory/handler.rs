use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{ValidatedJson, run_blocking};
use crate::auth::{CurrentUser, permissions};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult, ok};
use shared::models::{CatalogEntry, StockLevel};
use shared::request::RestockRequest;

/// PUT /api/catalog/{productId}
pub async fn upsert_catalog(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    ValidatedJson(entry): ValidatedJson<CatalogEntry>,
) -> AppResult<Json<ApiResponse<CatalogEntry>>> {
    user.require_admin()?;

    let orders = state.orders.clone();
    let entry = run_blocking(move || orders.upsert_catalog_entry(&product_id, entry)).await?;
    Ok(ok(entry))
}

/// GET /api/inventory/{productId}
pub async fn stock_level(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
) -> AppResult<Json<ApiResponse<StockLevel>>> {
    user.require_permission(permissions::INVENTORY_READ)?;

    let orders = state.orders.clone();
    let id = product_id.clone();
    let level = run_blocking(move || orders.stock_level(&id))
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {}", product_id)))?;
    Ok(ok(level))
}

/// POST /api/inventory/{productId}/restock
pub async fn restock(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(product_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<RestockRequest>,
) -> AppResult<Json<ApiResponse<StockLevel>>> {
    user.require_admin()?;

    tracing::info!(product_id = %product_id, quantity = payload.quantity, operator = %user.username, "Restock");
    let orders = state.orders.clone();
    let level = run_blocking(move || orders.restock(&product_id, payload.quantity)).await?;
    Ok(ok(level))
}
