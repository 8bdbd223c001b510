//! Order status transition rules
//!
//! All transition rules live in [`check_transition`]. The table is
//! permissive: any non-terminal status may move to any other status, so
//! operators can skip steps or revert a mis-click. Tightening the flow means
//! adding a rejection to [`check_transition`] and a matching [`TransitionError`].
//!
//! | from \ actor | Admin | Rider |
//! |--------------|-------|-------|
//! | non-terminal | any status | `in-transit`, `completed`, `cancelled` |
//! | `cancelled` / `completed` | rejected | rejected |

use shared::models::OrderStatus;

/// Who is driving a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// Authenticated admin via the order API
    Admin,
    /// Bearer of the order's rider token
    Rider,
}

/// Statuses a rider token may request
pub const RIDER_STATUSES: [OrderStatus; 3] = [
    OrderStatus::InTransit,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
];

/// Outcome of a transition check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Target equals current status; nothing to write
    Unchanged,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Order is already {0}")]
    AlreadyFinalized(OrderStatus),

    #[error("Riders cannot set status {0}")]
    NotAllowedForRider(OrderStatus),
}

pub fn is_rider_status(status: OrderStatus) -> bool {
    RIDER_STATUSES.contains(&status)
}

/// Validate a transition
pub fn check_transition(
    from: OrderStatus,
    to: OrderStatus,
    source: TransitionSource,
) -> Result<Transition, TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::AlreadyFinalized(from));
    }
    if source == TransitionSource::Rider && !is_rider_status(to) {
        return Err(TransitionError::NotAllowedForRider(to));
    }
    if from == to {
        return Ok(Transition::Unchanged);
    }
    Ok(Transition::Apply)
}

/// Whether entering `to` returns the order's reserved stock
pub fn restores_stock(to: OrderStatus, source: TransitionSource) -> bool {
    matches!(
        (to, source),
        (OrderStatus::Cancelled, _) | (OrderStatus::Completed, TransitionSource::Rider)
    )
}

/// Whether entering `to` notifies the customer
pub fn notifies_customer(to: OrderStatus) -> bool {
    matches!(to, OrderStatus::Confirm | OrderStatus::Delivered)
}

/// Whether an admin move into `to` needs a rider token on the order
pub fn mints_rider_token(to: OrderStatus) -> bool {
    matches!(to, OrderStatus::Confirm | OrderStatus::InTransit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in [OrderStatus::Cancelled, OrderStatus::Completed] {
            for to in OrderStatus::ALL {
                for source in [TransitionSource::Admin, TransitionSource::Rider] {
                    assert_eq!(
                        check_transition(from, to, source),
                        Err(TransitionError::AlreadyFinalized(from)),
                        "{from} -> {to} by {source:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_admin_may_move_between_any_statuses() {
        for from in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            for to in OrderStatus::ALL {
                let expected = if from == to {
                    Transition::Unchanged
                } else {
                    Transition::Apply
                };
                assert_eq!(
                    check_transition(from, to, TransitionSource::Admin),
                    Ok(expected)
                );
            }
        }
    }

    #[test]
    fn test_pending_to_delivered_is_legal() {
        assert_eq!(
            check_transition(OrderStatus::Pending, OrderStatus::Delivered, TransitionSource::Admin),
            Ok(Transition::Apply)
        );
    }

    #[test]
    fn test_rider_cannot_reach_admin_statuses() {
        for to in [OrderStatus::Pending, OrderStatus::Confirm, OrderStatus::Delivered] {
            assert_eq!(
                check_transition(OrderStatus::InTransit, to, TransitionSource::Rider),
                Err(TransitionError::NotAllowedForRider(to))
            );
        }
        assert_eq!(
            check_transition(OrderStatus::Confirm, OrderStatus::InTransit, TransitionSource::Rider),
            Ok(Transition::Apply)
        );
    }

    #[test]
    fn test_repeated_rider_scan_is_unchanged() {
        assert_eq!(
            check_transition(OrderStatus::InTransit, OrderStatus::InTransit, TransitionSource::Rider),
            Ok(Transition::Unchanged)
        );
    }

    #[test]
    fn test_side_effect_flags() {
        assert!(restores_stock(OrderStatus::Cancelled, TransitionSource::Admin));
        assert!(restores_stock(OrderStatus::Cancelled, TransitionSource::Rider));
        assert!(restores_stock(OrderStatus::Completed, TransitionSource::Rider));
        assert!(!restores_stock(OrderStatus::Completed, TransitionSource::Admin));
        assert!(!restores_stock(OrderStatus::InTransit, TransitionSource::Rider));

        assert!(notifies_customer(OrderStatus::Confirm));
        assert!(notifies_customer(OrderStatus::Delivered));
        assert!(!notifies_customer(OrderStatus::InTransit));

        assert!(mints_rider_token(OrderStatus::Confirm));
        assert!(mints_rider_token(OrderStatus::InTransit));
        assert!(!mints_rider_token(OrderStatus::Delivered));
    }
}
