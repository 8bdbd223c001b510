//! Catalog and stock models

use serde::{Deserialize, Serialize};

/// Catalog data snapshotted into line items at checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
    /// Unit price in minor units
    pub price: i64,
    #[serde(default)]
    pub image: String,
}

/// Available quantity of one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: String,
    pub available: u64,
}
