//! redb-based storage layer for the order desk
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `catalog` | `product_id` | `CatalogEntry` (JSON) | 商品标题、单价、图片 |
//! | `stock` | `product_id` | `u64` | Available units |
//! | `reserved` | `product_id` | `u64` | Units debited and not yet released |
//! | `orders` | `order_id` | `Order` (JSON) | Order records |
//! | `orders_by_time` | `(created_at, order_id)` | `()` | Listing index, newest last |
//! | `rider_tokens` | `sha256(token)` hex | `order_id` | Rider token index |
//!
//! # Concurrency
//!
//! redb allows one write transaction at a time. Every multi-step change
//! (reserve + insert, release + delete, transition + restock) runs inside a
//! single `WriteTransaction`, so concurrent requests are serialized and a
//! failed step leaves nothing behind.
//!
//! Raw rider tokens are never used as keys; the index stores their SHA-256.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{CatalogEntry, Order};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for catalog entries: key = product_id, value = JSON-serialized CatalogEntry
const CATALOG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("catalog");

/// Table for available stock: key = product_id, value = units on hand
const STOCK_TABLE: TableDefinition<&str, u64> = TableDefinition::new("stock");

/// Table for outstanding reservations: key = product_id, value = units reserved
const RESERVED_TABLE: TableDefinition<&str, u64> = TableDefinition::new("reserved");

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Listing index: key = (created_at, order_id). `created_at` never changes after insert.
const ORDERS_BY_TIME_TABLE: TableDefinition<(i64, &str), ()> = TableDefinition::new("orders_by_time");

/// Table for rider token lookup: key = hex(sha256(token)), value = order_id
const RIDER_TOKENS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("rider_tokens");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order storage backed by redb
#[derive(Clone)]
pub struct OrderStorage {
    db: Arc<Database>,
}

impl OrderStorage {
    /// Open or create the database at the given path
    ///
    /// Parent directories are created when missing. Commits are durable as
    /// soon as `commit()` returns (redb default `Durability::Immediate`).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CATALOG_TABLE)?;
            let _ = write_txn.open_table(STOCK_TABLE)?;
            let _ = write_txn.open_table(RESERVED_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_BY_TIME_TABLE)?;
            let _ = write_txn.open_table(RIDER_TOKENS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Catalog ==========

    /// Get a catalog entry (within transaction)
    pub fn get_catalog_entry_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<CatalogEntry>> {
        let table = txn.open_table(CATALOG_TABLE)?;
        match table.get(product_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a catalog entry
    pub fn put_catalog_entry(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        entry: &CatalogEntry,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CATALOG_TABLE)?;
        let value = serde_json::to_vec(entry)?;
        table.insert(product_id, value.as_slice())?;
        Ok(())
    }

    // ========== Stock ==========

    /// Get available units (within transaction). `None` when the product has no stock row.
    pub fn get_stock_txn(&self, txn: &WriteTransaction, product_id: &str) -> StorageResult<Option<u64>> {
        let table = txn.open_table(STOCK_TABLE)?;
        Ok(table.get(product_id)?.map(|guard| guard.value()))
    }

    /// Get available units (read-only)
    pub fn get_stock(&self, product_id: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        Ok(table.get(product_id)?.map(|guard| guard.value()))
    }

    pub fn set_stock(&self, txn: &WriteTransaction, product_id: &str, units: u64) -> StorageResult<()> {
        let mut table = txn.open_table(STOCK_TABLE)?;
        table.insert(product_id, units)?;
        Ok(())
    }

    /// Get reserved units (within transaction)
    pub fn get_reserved_txn(&self, txn: &WriteTransaction, product_id: &str) -> StorageResult<u64> {
        let table = txn.open_table(RESERVED_TABLE)?;
        Ok(table.get(product_id)?.map(|guard| guard.value()).unwrap_or(0))
    }

    /// Get reserved units (read-only)
    pub fn get_reserved(&self, product_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVED_TABLE)?;
        Ok(table.get(product_id)?.map(|guard| guard.value()).unwrap_or(0))
    }

    pub fn set_reserved(&self, txn: &WriteTransaction, product_id: &str, units: u64) -> StorageResult<()> {
        let mut table = txn.open_table(RESERVED_TABLE)?;
        if units == 0 {
            table.remove(product_id)?;
        } else {
            table.insert(product_id, units)?;
        }
        Ok(())
    }

    // ========== Orders ==========

    /// Get an order (within transaction)
    pub fn get_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order (read-only)
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Insert or replace an order
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;

        let mut index = txn.open_table(ORDERS_BY_TIME_TABLE)?;
        index.insert((order.created_at, order.id.as_str()), ())?;
        Ok(())
    }

    /// Remove an order, returning whether it existed
    pub fn remove_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<bool> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let Some(guard) = table.remove(order_id)? else {
            return Ok(false);
        };
        let order: Order = serde_json::from_slice(guard.value())?;
        drop(guard);

        let mut index = txn.open_table(ORDERS_BY_TIME_TABLE)?;
        index.remove((order.created_at, order.id.as_str()))?;
        Ok(true)
    }

    /// List orders, newest first
    ///
    /// Walks the time index backwards, so only the requested page is decoded.
    /// Orders with the same `created_at` come out in descending id order.
    pub fn list_orders(&self, limit: usize, offset: usize) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDERS_BY_TIME_TABLE)?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for entry in index.iter()?.rev().skip(offset).take(limit) {
            let (key, _) = entry?;
            let (_, order_id) = key.value();
            match table.get(order_id)? {
                Some(guard) => orders.push(serde_json::from_slice::<Order>(guard.value())?),
                None => tracing::warn!(order_id = %order_id, "Listing index points at a missing order"),
            }
        }
        Ok(orders)
    }

    /// Count stored orders
    pub fn count_orders(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Rider Tokens ==========

    /// Index a rider token hash to its order
    pub fn put_rider_token(
        &self,
        txn: &WriteTransaction,
        token_hash: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(RIDER_TOKENS_TABLE)?;
        table.insert(token_hash, order_id)?;
        Ok(())
    }

    /// Resolve a rider token hash to an order id (within transaction)
    pub fn find_order_by_token_txn(
        &self,
        txn: &WriteTransaction,
        token_hash: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(RIDER_TOKENS_TABLE)?;
        Ok(table.get(token_hash)?.map(|guard| guard.value().to_string()))
    }

    /// Resolve a rider token hash to an order id (read-only)
    pub fn find_order_by_token(&self, token_hash: &str) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RIDER_TOKENS_TABLE)?;
        Ok(table.get(token_hash)?.map(|guard| guard.value().to_string()))
    }

    pub fn remove_rider_token(&self, txn: &WriteTransaction, token_hash: &str) -> StorageResult<()> {
        let mut table = txn.open_table(RIDER_TOKENS_TABLE)?;
        table.remove(token_hash)?;
        Ok(())
    }
}

impl std::fmt::Debug for OrderStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStorage").finish_non_exhaustive()
    }
}
