use super::super::storage::StorageError;
use super::super::transitions::TransitionError;
use crate::inventory::LedgerError;
use crate::rider::token::TokenError;
use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order has no lines")]
    EmptyOrder,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u64,
        available: u64,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order already finalized: {0}")]
    OrderAlreadyFinalized(String),

    #[error("Riders cannot set status {0}")]
    RiderTransitionNotAllowed(OrderStatus),

    #[error("Rider token invalid")]
    TokenInvalid,

    #[error("Transaction exceeded its time budget")]
    TransactionTimeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ManagerError {
    /// Attach the order id to a state-machine rejection
    pub fn from_transition(err: TransitionError, order_id: &str) -> Self {
        match err {
            TransitionError::AlreadyFinalized(_) => {
                ManagerError::OrderAlreadyFinalized(order_id.to_string())
            }
            TransitionError::NotAllowedForRider(status) => {
                ManagerError::RiderTransitionNotAllowed(status)
            }
        }
    }
}

impl From<LedgerError> for ManagerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(e) => ManagerError::Storage(e),
            LedgerError::ProductNotFound(id) => ManagerError::ProductNotFound(id),
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => ManagerError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            LedgerError::InvalidQuantity(msg) => ManagerError::Validation(msg),
        }
    }
}

impl From<TokenError> for ManagerError {
    fn from(err: TokenError) -> Self {
        ManagerError::Internal(err.to_string())
    }
}

/// 将存储错误转换为错误码
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    if let StorageError::Serialization(_) = e {
        return ErrorCode::StorageCorrupted;
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return ErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // 默认：存储暂不可用，调用方重试
    ErrorCode::StorageUnavailable
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                // 技术细节只进日志，不返回给调用方
                tracing::error!(error = %e, error_code = %code, "Storage error occurred");
                AppError::new(code)
            }
            ManagerError::Validation(msg) => AppError::validation(msg),
            ManagerError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            ManagerError::ProductNotFound(id) => AppError::product_not_found(id),
            ManagerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::insufficient_stock(product_id)
                .with_detail("requested", requested)
                .with_detail("available", available),
            ManagerError::OrderNotFound(id) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", id),
            )
            .with_detail("order_id", id),
            ManagerError::OrderAlreadyFinalized(id) => AppError::with_message(
                ErrorCode::OrderAlreadyFinalized,
                format!("Order already finalized: {}", id),
            )
            .with_detail("order_id", id),
            ManagerError::RiderTransitionNotAllowed(status) => AppError::with_message(
                ErrorCode::RiderTransitionNotAllowed,
                format!("Riders cannot set status {}", status),
            ),
            ManagerError::TokenInvalid => AppError::new(ErrorCode::RiderTokenInvalid),
            ManagerError::TransactionTimeout => AppError::new(ErrorCode::TimeoutError),
            ManagerError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal manager error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn status_of(err: ManagerError) -> (ErrorCode, StatusCode) {
        let app: AppError = err.into();
        (app.code, app.http_status())
    }

    #[test]
    fn test_business_errors_map_to_specific_codes() {
        assert_eq!(
            status_of(ManagerError::InsufficientStock {
                product_id: "P".into(),
                requested: 2,
                available: 1,
            }),
            (ErrorCode::InsufficientStock, StatusCode::BAD_REQUEST)
        );
        assert_eq!(
            status_of(ManagerError::ProductNotFound("P".into())),
            (ErrorCode::ProductNotFound, StatusCode::BAD_REQUEST)
        );
        assert_eq!(
            status_of(ManagerError::OrderNotFound("o".into())),
            (ErrorCode::OrderNotFound, StatusCode::NOT_FOUND)
        );
        assert_eq!(
            status_of(ManagerError::OrderAlreadyFinalized("o".into())),
            (ErrorCode::OrderAlreadyFinalized, StatusCode::CONFLICT)
        );
        assert_eq!(
            status_of(ManagerError::TokenInvalid),
            (ErrorCode::RiderTokenInvalid, StatusCode::NOT_FOUND)
        );
        assert_eq!(
            status_of(ManagerError::RiderTransitionNotAllowed(OrderStatus::Confirm)),
            (ErrorCode::RiderTransitionNotAllowed, StatusCode::FORBIDDEN)
        );
        assert_eq!(
            status_of(ManagerError::TransactionTimeout),
            (ErrorCode::TimeoutError, StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn test_insufficient_stock_names_the_product() {
        let app: AppError = ManagerError::InsufficientStock {
            product_id: "Q".into(),
            requested: 1,
            available: 0,
        }
        .into();
        let details = app.details.unwrap();
        assert_eq!(details["product_id"], "Q");
        assert_eq!(details["available"], 0);
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let err = StorageError::Io(std::io::Error::other("secret path /var/db"));
        let app: AppError = ManagerError::Storage(err).into();
        assert_eq!(app.code, ErrorCode::StorageUnavailable);
        assert!(!app.message.contains("/var/db"));
        assert_eq!(app.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_transition_error_carries_order_id() {
        let err = ManagerError::from_transition(
            TransitionError::AlreadyFinalized(OrderStatus::Completed),
            "o-9",
        );
        assert!(matches!(err, ManagerError::OrderAlreadyFinalized(id) if id == "o-9"));
    }
}
