//! Inventory ledger
//!
//! Every stock mutation goes through here. The `*_in` variants run inside a
//! caller-owned write transaction so the order manager can reserve several
//! products and insert the order atomically; the plain variants open and
//! commit their own transaction.
//!
//! Two counters are kept per product:
//! - `stock`: units available for new orders (never negative)
//! - `reserved`: units debited by orders and not yet released. Orders an
//!   admin marks `completed` stay debited, so their units remain here until
//!   the order is deleted. Used only to flag releases that exceed what was
//!   ever reserved

use redb::WriteTransaction;
use thiserror::Error;

use crate::orders::storage::{OrderStorage, StorageError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u64,
        available: u64,
    },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Per-product stock ledger backed by [`OrderStorage`]
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    storage: OrderStorage,
}

impl InventoryLedger {
    pub fn new(storage: OrderStorage) -> Self {
        Self { storage }
    }

    // ========== Transaction-scoped primitives ==========

    /// Debit `qty` units if available. Returns the remaining stock.
    pub fn check_and_reserve_in(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        qty: u64,
    ) -> LedgerResult<u64> {
        ensure_positive(product_id, qty)?;
        let available = self
            .storage
            .get_stock_txn(txn, product_id)?
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))?;

        let Some(remaining) = available.checked_sub(qty) else {
            return Err(LedgerError::InsufficientStock {
                product_id: product_id.to_string(),
                requested: qty,
                available,
            });
        };

        let reserved = self.storage.get_reserved_txn(txn, product_id)?;
        let reserved = reserved.checked_add(qty).ok_or_else(|| {
            LedgerError::InvalidQuantity(format!("reserved counter overflow for {product_id}"))
        })?;

        self.storage.set_stock(txn, product_id, remaining)?;
        self.storage.set_reserved(txn, product_id, reserved)?;
        Ok(remaining)
    }

    /// Return `qty` previously reserved units. Returns the new stock.
    ///
    /// Releasing more than is outstanding is logged and still applied.
    pub fn release_in(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        qty: u64,
    ) -> LedgerResult<u64> {
        ensure_positive(product_id, qty)?;
        let available = self.storage.get_stock_txn(txn, product_id)?.unwrap_or(0);
        let reserved = self.storage.get_reserved_txn(txn, product_id)?;

        if qty > reserved {
            tracing::warn!(
                target: "inventory",
                product_id = %product_id,
                qty,
                reserved,
                "Release exceeds outstanding reservation"
            );
        }

        let restored = available.checked_add(qty).ok_or_else(|| {
            LedgerError::InvalidQuantity(format!("stock overflow for {product_id}"))
        })?;

        self.storage.set_stock(txn, product_id, restored)?;
        self.storage
            .set_reserved(txn, product_id, reserved.saturating_sub(qty))?;
        Ok(restored)
    }

    /// Add catalog-side stock. Returns the new stock.
    pub fn restock_in(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        qty: u64,
    ) -> LedgerResult<u64> {
        ensure_positive(product_id, qty)?;
        let available = self
            .storage
            .get_stock_txn(txn, product_id)?
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.to_string()))?;
        let updated = available.checked_add(qty).ok_or_else(|| {
            LedgerError::InvalidQuantity(format!("stock overflow for {product_id}"))
        })?;
        self.storage.set_stock(txn, product_id, updated)?;
        Ok(updated)
    }

    // ========== Standalone operations ==========

    pub fn check_and_reserve(&self, product_id: &str, qty: u64) -> LedgerResult<u64> {
        self.in_own_txn(|txn| self.check_and_reserve_in(txn, product_id, qty))
    }

    pub fn release(&self, product_id: &str, qty: u64) -> LedgerResult<u64> {
        self.in_own_txn(|txn| self.release_in(txn, product_id, qty))
    }

    pub fn restock(&self, product_id: &str, qty: u64) -> LedgerResult<u64> {
        self.in_own_txn(|txn| self.restock_in(txn, product_id, qty))
    }

    /// Units available for new orders, `None` for unknown products
    pub fn available(&self, product_id: &str) -> LedgerResult<Option<u64>> {
        Ok(self.storage.get_stock(product_id)?)
    }

    /// Units debited by orders and not yet released
    pub fn reserved(&self, product_id: &str) -> LedgerResult<u64> {
        Ok(self.storage.get_reserved(product_id)?)
    }

    fn in_own_txn<T>(
        &self,
        op: impl FnOnce(&WriteTransaction) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let txn = self.storage.begin_write()?;
        match op(&txn) {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "Failed to abort ledger transaction");
                }
                Err(e)
            }
        }
    }
}

fn ensure_positive(product_id: &str, qty: u64) -> LedgerResult<()> {
    if qty == 0 {
        return Err(LedgerError::InvalidQuantity(format!(
            "quantity for {product_id} must be at least 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_stock(entries: &[(&str, u64)]) -> InventoryLedger {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (id, qty) in entries {
            storage.set_stock(&txn, id, *qty).unwrap();
        }
        txn.commit().unwrap();
        InventoryLedger::new(storage)
    }

    #[test]
    fn test_reserve_debits_stock() {
        let ledger = ledger_with_stock(&[("P", 5)]);
        assert_eq!(ledger.check_and_reserve("P", 2).unwrap(), 3);
        assert_eq!(ledger.available("P").unwrap(), Some(3));
        assert_eq!(ledger.reserved("P").unwrap(), 2);
    }

    #[test]
    fn test_reserve_exact_remaining_reaches_zero() {
        let ledger = ledger_with_stock(&[("P", 1)]);
        assert_eq!(ledger.check_and_reserve("P", 1).unwrap(), 0);
        assert!(matches!(
            ledger.check_and_reserve("P", 1),
            Err(LedgerError::InsufficientStock { available: 0, requested: 1, .. })
        ));
        assert_eq!(ledger.available("P").unwrap(), Some(0));
    }

    #[test]
    fn test_insufficient_stock_leaves_stock_untouched() {
        let ledger = ledger_with_stock(&[("P", 2)]);
        let err = ledger.check_and_reserve("P", 3).unwrap_err();
        match err {
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, "P");
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ledger.available("P").unwrap(), Some(2));
        assert_eq!(ledger.reserved("P").unwrap(), 0);
    }

    #[test]
    fn test_unknown_product() {
        let ledger = ledger_with_stock(&[]);
        assert!(matches!(
            ledger.check_and_reserve("ghost", 1),
            Err(LedgerError::ProductNotFound(id)) if id == "ghost"
        ));
        assert_eq!(ledger.available("ghost").unwrap(), None);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let ledger = ledger_with_stock(&[("P", 5)]);
        assert!(matches!(
            ledger.check_and_reserve("P", 0),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert!(matches!(ledger.release("P", 0), Err(LedgerError::InvalidQuantity(_))));
        assert!(matches!(ledger.restock("P", 0), Err(LedgerError::InvalidQuantity(_))));
    }

    #[test]
    fn test_release_restores_what_was_reserved() {
        let ledger = ledger_with_stock(&[("P", 5)]);
        ledger.check_and_reserve("P", 4).unwrap();
        assert_eq!(ledger.release("P", 4).unwrap(), 5);
        assert_eq!(ledger.reserved("P").unwrap(), 0);
    }

    #[test]
    fn test_over_release_still_succeeds() {
        let ledger = ledger_with_stock(&[("P", 5)]);
        ledger.check_and_reserve("P", 1).unwrap();
        // Caller bug: releasing 3 with only 1 outstanding
        assert_eq!(ledger.release("P", 3).unwrap(), 7);
        assert_eq!(ledger.reserved("P").unwrap(), 0);
    }

    #[test]
    fn test_restock_requires_known_product() {
        let ledger = ledger_with_stock(&[("P", 1)]);
        assert_eq!(ledger.restock("P", 9).unwrap(), 10);
        assert_eq!(ledger.reserved("P").unwrap(), 0);
        assert!(matches!(
            ledger.restock("ghost", 1),
            Err(LedgerError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_restock_overflow_rejected() {
        let ledger = ledger_with_stock(&[("P", u64::MAX)]);
        assert!(matches!(
            ledger.restock("P", 1),
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert_eq!(ledger.available("P").unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_reservations_in_aborted_txn_are_discarded() {
        let storage = OrderStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        storage.set_stock(&txn, "P", 5).unwrap();
        storage.set_stock(&txn, "Q", 0).unwrap();
        txn.commit().unwrap();
        let ledger = InventoryLedger::new(storage.clone());

        let txn = storage.begin_write().unwrap();
        ledger.check_and_reserve_in(&txn, "P", 2).unwrap();
        assert!(ledger.check_and_reserve_in(&txn, "Q", 1).is_err());
        txn.abort().unwrap();

        assert_eq!(ledger.available("P").unwrap(), Some(5));
        assert_eq!(ledger.reserved("P").unwrap(), 0);
    }
}
