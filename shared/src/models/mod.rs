//! Domain models shared by the server and its clients

pub mod order;
pub mod product;

pub use order::{CustomerContact, LineItem, Order, OrderStatus};
pub use product::{CatalogEntry, StockLevel};
