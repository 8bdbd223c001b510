//! Order lifecycle module
//!
//! - **manager**: `OrdersManager`, the creation/deletion transactions and admin transitions
//! - **storage**: redb persistence for catalog, stock, orders and rider tokens
//! - **transitions**: the status transition table
//! - **event**: events broadcast after each commit
//!
//! # Architecture
//!
//! ```text
//! HTTP handler → OrdersManager / RiderGateway → redb write txn → commit
//!                                                               ↓
//!                                                          Broadcast
//!                                                               ↓
//!                                                    NotificationWorker
//! ```

pub mod event;
pub mod manager;
pub mod storage;
pub mod transitions;

pub use event::{OrderEvent, OrderEventKind};
pub use manager::{DeleteOutcome, ManagerError, ManagerResult, OrdersManager};
pub use storage::{OrderStorage, StorageError};
pub use transitions::TransitionSource;
