//! Order API Module
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /api/orders | POST | 下单 | 无 |
//! | /api/orders | GET | 订单列表 (最新在前) | orders:read |
//! | /api/orders/{id} | GET | 订单详情 | orders:read |
//! | /api/orders/{id}/status | PUT | 修改状态 | 管理员 |
//! | /api/orders/{id}/rider | PUT | 指派骑手 | 管理员 |
//! | /api/orders/{id} | DELETE | 删除并回补库存 | 管理员 |

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/rider", put(handler::assign_rider))
}
