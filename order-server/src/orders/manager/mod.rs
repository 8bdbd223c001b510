//! OrdersManager - order lifecycle on top of redb
//!
//! This module handles:
//! - Order creation (reserve stock + snapshot catalog + insert, atomically)
//! - Order deletion (release stock + remove order + drop token index, atomically)
//! - Admin status transitions and their side effects
//! - Catalog seeding and restock
//! - Event broadcasting after commit
//!
//! # Creation Flow
//!
//! ```text
//! create_order(req)
//!     ├─ 1. Validate contact + lines, merge duplicate products
//!     ├─ 2. Begin write transaction (exclusive writer)
//!     ├─ 3. For each line: read catalog snapshot, check and reserve stock
//!     ├─ 4. Build line items, sum amount, insert order
//!     ├─ 5. Check time budget (abort on overrun)
//!     ├─ 6. Commit transaction
//!     └─ 7. Broadcast `Created`
//! ```
//!
//! Any error between 2 and 6 aborts the transaction; no stock is debited and
//! no order is stored.

mod error;
pub use error::*;

use super::event::{OrderEvent, OrderEventKind};
use super::storage::{OrderStorage, StorageError};
use super::transitions::{self, Transition, TransitionSource};
use crate::inventory::InventoryLedger;
use crate::rider::token;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_ORDER_LINES, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_contact,
    validate_order_optional_text, validate_order_text,
};
use chrono::Utc;
use redb::WriteTransaction;
use serde::{Deserialize, Serialize};
use shared::models::{CatalogEntry, CustomerContact, LineItem, Order, OrderStatus, StockLevel};
use shared::request::{CreateOrderRequest, OrderLineRequest};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Default time budget for one write transaction
pub const DEFAULT_TX_BUDGET: Duration = Duration::from_secs(2);

/// Result of deleting an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Reserved stock is back in the ledger
    pub restored: bool,
    /// Units returned by this deletion (0 when already released earlier)
    pub units_released: u64,
}

/// OrdersManager for order lifecycle operations
pub struct OrdersManager {
    storage: OrderStorage,
    ledger: InventoryLedger,
    event_tx: broadcast::Sender<OrderEvent>,
    tx_budget: Duration,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<OrderStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("tx_budget", &self.tx_budget)
            .finish()
    }
}

impl OrdersManager {
    /// Create a new OrdersManager with the given database path
    pub fn new(db_path: impl AsRef<Path>, tx_budget: Duration) -> ManagerResult<Self> {
        let storage = OrderStorage::open(db_path)?;
        Ok(Self::from_storage(storage, tx_budget))
    }

    pub fn from_storage(storage: OrderStorage, tx_budget: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        tracing::info!(tx_budget_ms = tx_budget.as_millis() as u64, "OrdersManager started");
        Self {
            ledger: InventoryLedger::new(storage.clone()),
            storage,
            event_tx,
            tx_budget,
        }
    }

    /// Create an OrdersManager with existing storage (for testing)
    #[cfg(test)]
    pub fn with_storage(storage: OrderStorage) -> Self {
        Self::from_storage(storage, DEFAULT_TX_BUDGET)
    }

    /// Subscribe to order events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    // ========== Orders ==========

    /// Create an order, reserving stock for every line
    pub fn create_order(&self, req: CreateOrderRequest) -> ManagerResult<Order> {
        validate_contact(&req.contact)?;
        let lines = merge_lines(&req.lines)?;

        let order = self.with_write_txn(|txn| self.reserve_and_insert(txn, req.contact, &lines))?;

        tracing::info!(
            order_id = %order.id,
            lines = order.lines.len(),
            amount = order.amount,
            "Order created"
        );
        self.publish(OrderEvent::new(
            &order.id,
            &order.contact.phone,
            OrderEventKind::Created,
        ));
        Ok(order)
    }

    fn reserve_and_insert(
        &self,
        txn: &WriteTransaction,
        contact: CustomerContact,
        lines: &[(String, u32)],
    ) -> ManagerResult<Order> {
        let mut items = Vec::with_capacity(lines.len());
        for (product_id, quantity) in lines {
            let entry = self
                .storage
                .get_catalog_entry_txn(txn, product_id)?
                .ok_or_else(|| ManagerError::ProductNotFound(product_id.clone()))?;

            self.ledger
                .check_and_reserve_in(txn, product_id, u64::from(*quantity))?;

            let subtotal = entry
                .price
                .checked_mul(i64::from(*quantity))
                .ok_or_else(|| {
                    ManagerError::Validation(format!("subtotal overflow for {product_id}"))
                })?;

            items.push(LineItem {
                product_id: product_id.clone(),
                title_snapshot: entry.title,
                unit_price: entry.price,
                quantity: *quantity,
                subtotal,
                image_snapshot: entry.image,
            });
        }

        let amount = Order::lines_total(&items)
            .ok_or_else(|| ManagerError::Validation("order amount overflow".to_string()))?;

        let now = Utc::now().timestamp_millis();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            contact,
            amount,
            lines: items,
            status: OrderStatus::Pending,
            delivery_rider_ref: None,
            rider_token: None,
            qr_payload: None,
            stock_released: false,
            created_at: now,
            updated_at: now,
        };
        self.storage.put_order(txn, &order)?;
        Ok(order)
    }

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// List orders, newest first
    pub fn list_orders(&self, limit: usize, offset: usize) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.list_orders(limit, offset)?)
    }

    /// Delete an order, returning its unreleased stock to the ledger
    pub fn delete_order(&self, order_id: &str) -> ManagerResult<DeleteOutcome> {
        let (order, units_released) = self.with_write_txn(|txn| {
            let order = self
                .storage
                .get_order_txn(txn, order_id)?
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;

            let units = if order.stock_released {
                0
            } else {
                self.release_lines_in(txn, &order)?
            };

            self.storage.remove_order(txn, order_id)?;
            if let Some(rider_token) = &order.rider_token {
                self.storage
                    .remove_rider_token(txn, &token::token_hash(rider_token))?;
            }
            Ok((order, units))
        })?;

        tracing::info!(order_id = %order_id, units_released, "Order deleted");
        self.publish(OrderEvent::new(
            order_id,
            &order.contact.phone,
            OrderEventKind::Deleted { units_released },
        ));
        Ok(DeleteOutcome {
            restored: true,
            units_released,
        })
    }

    /// Admin status transition
    pub fn update_status(&self, order_id: &str, new_status: OrderStatus) -> ManagerResult<Order> {
        let (order, previous) = self.with_write_txn(|txn| {
            let mut order = self
                .storage
                .get_order_txn(txn, order_id)?
                .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
            let previous =
                self.apply_transition_in(txn, &mut order, new_status, TransitionSource::Admin)?;
            Ok((order, previous))
        })?;

        if let Some(from) = previous {
            self.publish_status_change(&order, from, TransitionSource::Admin);
        }
        Ok(order)
    }

    // ========== Catalog / Inventory ==========

    /// Insert or replace a catalog entry; new products start with zero stock
    pub fn upsert_catalog_entry(
        &self,
        product_id: &str,
        entry: CatalogEntry,
    ) -> ManagerResult<CatalogEntry> {
        validate_order_text(product_id, "product_id", MAX_SHORT_TEXT_LEN)?;
        validate_order_text(&entry.title, "title", MAX_NAME_LEN)?;
        validate_order_optional_text(&entry.image, "image", MAX_URL_LEN)?;
        if entry.price < 0 {
            return Err(ManagerError::Validation(
                "price must not be negative".to_string(),
            ));
        }

        self.with_write_txn(|txn| {
            self.storage.put_catalog_entry(txn, product_id, &entry)?;
            if self.storage.get_stock_txn(txn, product_id)?.is_none() {
                self.storage.set_stock(txn, product_id, 0)?;
            }
            Ok(())
        })?;

        tracing::info!(product_id = %product_id, price = entry.price, "Catalog entry saved");
        Ok(entry)
    }

    /// Add stock for a catalog product
    pub fn restock(&self, product_id: &str, quantity: u64) -> ManagerResult<StockLevel> {
        let available = self.with_write_txn(|txn| {
            Ok(self.ledger.restock_in(txn, product_id, quantity)?)
        })?;
        tracing::info!(product_id = %product_id, quantity, available, "Product restocked");
        Ok(StockLevel {
            product_id: product_id.to_string(),
            available,
        })
    }

    /// Stock level of a product, `None` when the product has no stock row
    pub fn stock_level(&self, product_id: &str) -> ManagerResult<Option<StockLevel>> {
        let level = self.ledger.available(product_id)?.map(|available| StockLevel {
            product_id: product_id.to_string(),
            available,
        });
        Ok(level)
    }

    // ========== Transaction helpers ==========

    /// Run `op` in one write transaction under the time budget
    ///
    /// The budget covers waiting for the writer lock as well as the work
    /// itself. On error or overrun the transaction is aborted.
    pub(crate) fn with_write_txn<T>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> ManagerResult<T>,
    ) -> ManagerResult<T> {
        let started = Instant::now();
        let txn = self.storage.begin_write()?;

        let result = self.check_budget(started).and_then(|_| op(&txn)).and_then(|value| {
            self.check_budget(started)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    fn check_budget(&self, started: Instant) -> ManagerResult<()> {
        let elapsed = started.elapsed();
        if elapsed >= self.tx_budget {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.tx_budget.as_millis() as u64,
                "Write transaction exceeded time budget, aborting"
            );
            return Err(ManagerError::TransactionTimeout);
        }
        Ok(())
    }

    /// Apply a validated transition and its side effects to `order`
    ///
    /// Returns the previous status, or `None` when the order already had
    /// `to` and nothing was written.
    pub(crate) fn apply_transition_in(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        to: OrderStatus,
        source: TransitionSource,
    ) -> ManagerResult<Option<OrderStatus>> {
        let from = order.status;
        match transitions::check_transition(from, to, source) {
            Ok(Transition::Unchanged) => return Ok(None),
            Ok(Transition::Apply) => {}
            Err(e) => return Err(ManagerError::from_transition(e, &order.id)),
        }

        if transitions::restores_stock(to, source) && !order.stock_released {
            let units = self.release_lines_in(txn, order)?;
            order.stock_released = true;
            tracing::info!(order_id = %order.id, units, status = %to, "Reserved stock released");
        }

        if source == TransitionSource::Admin && transitions::mints_rider_token(to) {
            self.attach_rider_token_in(txn, order)?;
        }

        order.status = to;
        order.updated_at = Utc::now().timestamp_millis();
        self.storage.put_order(txn, order)?;
        Ok(Some(from))
    }

    /// Mint and index a rider token unless the order already has one
    pub(crate) fn attach_rider_token_in(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
    ) -> ManagerResult<()> {
        if order.rider_token.is_some() {
            return Ok(());
        }
        let minted = token::mint(&order.id)?;
        self.storage
            .put_rider_token(txn, &minted.token_hash, &order.id)?;
        order.rider_token = Some(minted.token);
        order.qr_payload = Some(minted.qr_payload);
        tracing::info!(order_id = %order.id, "Rider token minted");
        Ok(())
    }

    fn release_lines_in(&self, txn: &WriteTransaction, order: &Order) -> ManagerResult<u64> {
        let mut units = 0u64;
        for line in &order.lines {
            let qty = u64::from(line.quantity);
            self.ledger.release_in(txn, &line.product_id, qty)?;
            units = units.saturating_add(qty);
        }
        Ok(units)
    }

    // ========== Events ==========

    pub(crate) fn publish(&self, event: OrderEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn publish_status_change(
        &self,
        order: &Order,
        from: OrderStatus,
        source: TransitionSource,
    ) {
        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %order.status,
            source = ?source,
            "Order status changed"
        );
        self.publish(OrderEvent::new(
            &order.id,
            &order.contact.phone,
            OrderEventKind::StatusChanged {
                from,
                to: order.status,
                source,
            },
        ));
    }
}

/// Validate request lines and merge duplicate products, keeping first-seen order
fn merge_lines(lines: &[OrderLineRequest]) -> ManagerResult<Vec<(String, u32)>> {
    if lines.is_empty() {
        return Err(ManagerError::EmptyOrder);
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(ManagerError::Validation(format!(
            "too many lines ({}, max {MAX_ORDER_LINES})",
            lines.len()
        )));
    }

    let mut merged: Vec<(String, u32)> = Vec::with_capacity(lines.len());
    for line in lines {
        validate_order_text(&line.product_id, "product_id", MAX_SHORT_TEXT_LEN)?;
        if line.quantity == 0 {
            return Err(ManagerError::Validation(format!(
                "quantity for {} must be at least 1",
                line.product_id
            )));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => {
                *qty = qty.checked_add(line.quantity).ok_or_else(|| {
                    ManagerError::Validation(format!("quantity overflow for {}", line.product_id))
                })?;
            }
            None => merged.push((line.product_id.clone(), line.quantity)),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests;
