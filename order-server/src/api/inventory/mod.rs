//! Catalog / inventory API
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/catalog/{productId} | PUT | 写入商品快照数据 | 管理员 |
//! | /api/inventory/{productId} | GET | 查询可用库存 | inventory:read |
//! | /api/inventory/{productId}/restock | POST | 补货 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/catalog/{product_id}", put(handler::upsert_catalog))
        .route("/api/inventory/{product_id}", get(handler::stock_level))
        .route("/api/inventory/{product_id}/restock", post(handler::restock))
}
