//! Inventory ledger: the only write path for product stock

pub mod ledger;

pub use ledger::{InventoryLedger, LedgerError, LedgerResult};
