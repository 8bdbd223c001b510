//! Rider scan API
//!
//! `POST /api/scan/{riderToken}` 不需要管理员认证，令牌本身就是凭证。
//! 只能把令牌所属订单改为 `in-transit` / `completed` / `cancelled`。

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/scan/{rider_token}", post(handler::scan))
}
