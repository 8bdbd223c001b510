//! Order Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
///
/// `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirm,
    InTransit,
    Delivered,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirm,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Completed,
    ];

    /// Terminal states reject every further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirm => "confirm",
            OrderStatus::InTransit => "in-transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer contact captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub postal_code: String,
    pub email: String,
}

/// Line item snapshot, frozen at order creation
///
/// Title, price and image are copied from the catalog so historical orders
/// stay readable after the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: String,
    pub title_snapshot: String,
    /// Unit price in minor units
    pub unit_price: i64,
    pub quantity: u32,
    /// `unit_price * quantity`
    pub subtotal: i64,
    pub image_snapshot: String,
}

/// Order aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    /// Order ID (assigned by server)
    pub id: String,
    pub contact: CustomerContact,
    /// Sum of line subtotals in minor units, fixed at creation
    pub amount: i64,
    pub lines: Vec<LineItem>,
    pub status: OrderStatus,
    /// Assigned rider identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_rider_ref: Option<String>,
    /// Bearer credential for rider scans; immutable once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rider_token: Option<String>,
    /// Scannable rendering of `{order_id, rider_token}`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_payload: Option<String>,
    /// Whether the reserved stock has already been returned to the ledger
    #[serde(default)]
    pub stock_released: bool,
    /// Creation timestamp (Unix millis)
    pub created_at: i64,
    /// Last update timestamp (Unix millis)
    pub updated_at: i64,
}

impl Order {
    /// Sum of line subtotals, `None` on overflow
    pub fn lines_total(lines: &[LineItem]) -> Option<i64> {
        lines
            .iter()
            .try_fold(0i64, |acc, l| acc.checked_add(l.subtotal))
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }
}
