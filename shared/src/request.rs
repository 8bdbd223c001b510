//! Request payloads

use serde::{Deserialize, Serialize};

use crate::models::{CustomerContact, OrderStatus};

/// One requested line at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub contact: CustomerContact,
    pub lines: Vec<OrderLineRequest>,
}

/// Admin or rider status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub new_status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRiderRequest {
    pub rider_id: String,
}

/// Catalog-side stock increase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockRequest {
    pub quantity: u64,
}
