//! Permission Definitions
//!
//! Admin (`role == "admin"`) passes every check. Other roles need an explicit
//! permission or a `module:*` wildcard.

/// 查看订单
pub const ORDERS_READ: &str = "orders:read";

/// 查看库存
pub const INVENTORY_READ: &str = "inventory:read";
