//! 顾客通知 (customer notification)
//!
//! Order transitions into `confirm` or `delivered` notify the customer.
//! Delivery is fire-and-forget: the worker reacts to committed events, so a
//! failing transport never affects order state.
//!
//! - [`CustomerNotifier`] - transport abstraction
//! - [`LogNotifier`] - writes the notification to the log
//! - [`WebhookNotifier`] - POSTs JSON to an HTTP endpoint
//! - [`NotificationWorker`] - subscribes to order events and dispatches

pub mod webhook;
pub mod worker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::OrderStatus;
use thiserror::Error;

pub use webhook::WebhookNotifier;
pub use worker::NotificationWorker;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Notification content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerNotification {
    pub phone: String,
    pub order_id: String,
    pub status: OrderStatus,
}

#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    async fn notify(&self, notification: &CustomerNotification) -> Result<(), NotifyError>;
}

/// Notifier that only logs; used when no webhook is configured
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl CustomerNotifier for LogNotifier {
    async fn notify(&self, notification: &CustomerNotification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "notify",
            phone = %notification.phone,
            order_id = %notification.order_id,
            status = %notification.status,
            "Customer notification"
        );
        Ok(())
    }
}
