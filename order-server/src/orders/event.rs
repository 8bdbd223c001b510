//! Order events broadcast after each committed change

use serde::{Deserialize, Serialize};
use shared::models::OrderStatus;

use super::transitions::TransitionSource;

/// Event published on the manager's broadcast channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub order_id: String,
    /// Customer phone, carried for notification
    pub phone: String,
    pub timestamp: i64,
    #[serde(flatten)]
    pub kind: OrderEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    StatusChanged {
        from: OrderStatus,
        to: OrderStatus,
        source: TransitionSource,
    },
    RiderAssigned {
        rider_id: String,
    },
    Deleted {
        units_released: u64,
    },
}

impl OrderEvent {
    pub fn new(order_id: impl Into<String>, phone: impl Into<String>, kind: OrderEventKind) -> Self {
        Self {
            order_id: order_id.into(),
            phone: phone.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            kind,
        }
    }

    /// New status when this event changed one
    pub fn new_status(&self) -> Option<OrderStatus> {
        match &self.kind {
            OrderEventKind::StatusChanged { to, .. } => Some(*to),
            _ => None,
        }
    }
}
