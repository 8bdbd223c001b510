//! Shared types for the order service
//!
//! Types used by both the server and its clients: the order model and
//! status enum, request payloads, the unified error-code system and the
//! API response envelope.

pub mod error;
pub mod models;
pub mod request;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{CatalogEntry, CustomerContact, LineItem, Order, OrderStatus, StockLevel};
pub use request::{
    AssignRiderRequest, CreateOrderRequest, OrderLineRequest, RestockRequest, UpdateStatusRequest,
};
