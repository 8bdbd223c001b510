//! Rider authorization gateway
//!
//! Riders act on exactly one order: the one owning the token they present.
//! Orders are looked up by token hash only, never by an id supplied by an
//! unauthenticated caller. Unknown tokens all produce the same
//! [`ManagerError::TokenInvalid`].

use std::sync::Arc;

use chrono::Utc;
use shared::models::{Order, OrderStatus};

use super::token;
use crate::orders::event::{OrderEvent, OrderEventKind};
use crate::orders::manager::{ManagerError, ManagerResult, OrdersManager};
use crate::orders::transitions::{TransitionSource, is_rider_status};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_order_text};

#[derive(Debug, Clone)]
pub struct RiderGateway {
    manager: Arc<OrdersManager>,
}

impl RiderGateway {
    pub fn new(manager: Arc<OrdersManager>) -> Self {
        Self { manager }
    }

    /// Assign a rider, minting the token and QR payload on first assignment
    ///
    /// Reassignment keeps the existing token.
    pub fn assign_rider(&self, order_id: &str, rider_id: &str) -> ManagerResult<Order> {
        validate_order_text(rider_id, "rider_id", MAX_SHORT_TEXT_LEN)?;
        let storage = self.manager.storage();

        let order = self.manager.with_write_txn(|txn| {
            let mut order = storage
                .get_order_txn(txn, order_id)?
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
            if order.is_finalized() {
                return Err(ManagerError::OrderAlreadyFinalized(order_id.to_string()));
            }

            order.delivery_rider_ref = Some(rider_id.to_string());
            self.manager.attach_rider_token_in(txn, &mut order)?;
            order.updated_at = Utc::now().timestamp_millis();
            storage.put_order(txn, &order)?;
            Ok(order)
        })?;

        tracing::info!(order_id = %order_id, rider_id = %rider_id, "Rider assigned");
        self.manager.publish(OrderEvent::new(
            order_id,
            &order.contact.phone,
            OrderEventKind::RiderAssigned {
                rider_id: rider_id.to_string(),
            },
        ));
        Ok(order)
    }

    /// Apply a rider-requested status to the order owning `rider_token`
    pub fn scan_transition(&self, rider_token: &str, new_status: OrderStatus) -> ManagerResult<Order> {
        if !is_rider_status(new_status) {
            crate::security_log!("WARN", "rider_status_rejected", status = new_status.as_str());
            return Err(ManagerError::RiderTransitionNotAllowed(new_status));
        }

        let token_hash = token::token_hash(rider_token);
        let storage = self.manager.storage();

        let result = self.manager.with_write_txn(|txn| {
            let order_id = storage
                .find_order_by_token_txn(txn, &token_hash)?
                .ok_or(ManagerError::TokenInvalid)?;
            let mut order = storage
                .get_order_txn(txn, &order_id)?
                .ok_or(ManagerError::TokenInvalid)?;

            let matches = order
                .rider_token
                .as_deref()
                .is_some_and(|stored| token::tokens_match(stored, rider_token, &order.id));
            if !matches {
                return Err(ManagerError::TokenInvalid);
            }

            let previous = self.manager.apply_transition_in(
                txn,
                &mut order,
                new_status,
                TransitionSource::Rider,
            )?;
            Ok((order, previous))
        });

        let (order, previous) = match result {
            Ok(v) => v,
            Err(ManagerError::TokenInvalid) => {
                crate::security_log!("WARN", "rider_token_invalid", status = new_status.as_str());
                return Err(ManagerError::TokenInvalid);
            }
            Err(e) => return Err(e),
        };

        if let Some(from) = previous {
            self.manager
                .publish_status_change(&order, from, TransitionSource::Rider);
        }
        Ok(order)
    }
}
