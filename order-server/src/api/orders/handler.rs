//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::api::{ValidatedJson, run_blocking};
use crate::auth::{CurrentUser, permissions};
use crate::core::ServerState;
use crate::orders::DeleteOutcome;
use crate::utils::{ApiResponse, AppResult, created, ok};
use shared::models::Order;
use shared::request::{AssignRiderRequest, CreateOrderRequest, UpdateStatusRequest};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// POST /api/orders - 下单 (预留库存 + 快照 + 写入，单事务)
pub async fn create(
    State(state): State<ServerState>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.create_order(payload)).await?;
    Ok(created(order))
}

/// GET /api/orders - 订单列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    user.require_permission(permissions::ORDERS_READ)?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let orders = state.orders.clone();
    let list = run_blocking(move || orders.list_orders(limit, offset)).await?;
    Ok(ok(list))
}

/// GET /api/orders/{id} - 订单详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    user.require_permission(permissions::ORDERS_READ)?;

    let orders = state.orders.clone();
    let order = run_blocking(move || orders.get_order(&id)).await?;
    Ok(ok(order))
}

/// PUT /api/orders/{id}/status - 管理员修改状态
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    user.require_admin()?;

    tracing::info!(
        order_id = %id,
        new_status = %payload.new_status,
        operator = %user.username,
        "Admin status change"
    );
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.update_status(&id, payload.new_status)).await?;
    Ok(ok(order))
}

/// PUT /api/orders/{id}/rider - 指派骑手 (首次指派生成骑手令牌)
pub async fn assign_rider(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<AssignRiderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    user.require_admin()?;

    let riders = state.riders.clone();
    let order = run_blocking(move || riders.assign_rider(&id, &payload.rider_id)).await?;
    Ok(ok(order))
}

/// DELETE /api/orders/{id} - 删除订单并回补库存
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<DeleteOutcome>>> {
    user.require_admin()?;

    tracing::info!(order_id = %id, operator = %user.username, "Deleting order");
    let orders = state.orders.clone();
    let outcome = run_blocking(move || orders.delete_order(&id)).await?;
    Ok(ok(outcome))
}
