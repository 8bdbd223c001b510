use super::*;

#[test]
fn test_delete_pending_order_restores_stock() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);

    let order = manager.create_order(order_request(&[("P", 2)])).unwrap();
    assert_eq!(available(&manager, "P"), 3);

    let outcome = manager.delete_order(&order.id).unwrap();
    assert!(outcome.restored);
    assert_eq!(outcome.units_released, 2);
    assert_eq!(available(&manager, "P"), 5);
    assert_eq!(manager.ledger().reserved("P").unwrap(), 0);
    assert!(matches!(
        manager.get_order(&order.id),
        Err(ManagerError::OrderNotFound(_))
    ));
}

#[test]
fn test_delete_missing_order() {
    let manager = create_test_manager();
    assert!(matches!(
        manager.delete_order("nope"),
        Err(ManagerError::OrderNotFound(id)) if id == "nope"
    ));
}

#[test]
fn test_conservation_across_many_orders() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 50);
    seed_product(&manager, "Q", 250, 20);

    let mut ids = Vec::new();
    for i in 1..=5u32 {
        let order = manager
            .create_order(order_request(&[("P", i), ("Q", 6 - i)]))
            .unwrap();
        ids.push(order.id);
    }
    assert_eq!(available(&manager, "P"), 50 - 15);
    assert_eq!(available(&manager, "Q"), 20 - 15);

    // Cancel some, delete the rest; cancelled ones are then deleted too
    manager.update_status(&ids[0], OrderStatus::Cancelled).unwrap();
    manager.update_status(&ids[1], OrderStatus::Cancelled).unwrap();
    for id in &ids {
        manager.delete_order(id).unwrap();
    }

    assert_eq!(available(&manager, "P"), 50);
    assert_eq!(available(&manager, "Q"), 20);
    assert_eq!(manager.ledger().reserved("P").unwrap(), 0);
    assert_eq!(manager.ledger().reserved("Q").unwrap(), 0);
}

#[test]
fn test_admin_cancel_restores_once() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 2)])).unwrap();

    let cancelled = manager
        .update_status(&order.id, OrderStatus::Cancelled)
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.stock_released);
    assert_eq!(available(&manager, "P"), 5);

    let outcome = manager.delete_order(&order.id).unwrap();
    assert!(outcome.restored);
    assert_eq!(outcome.units_released, 0);
    assert_eq!(available(&manager, "P"), 5);
}

#[test]
fn test_admin_completed_keeps_stock_debited() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 2)])).unwrap();

    let completed = manager
        .update_status(&order.id, OrderStatus::Completed)
        .unwrap();
    assert!(!completed.stock_released);
    assert_eq!(available(&manager, "P"), 3);
    // Fulfilled units stay on the reserved counter until the order is deleted
    assert_eq!(manager.ledger().reserved("P").unwrap(), 2);

    let outcome = manager.delete_order(&order.id).unwrap();
    assert_eq!(outcome.units_released, 2);
    assert_eq!(manager.ledger().reserved("P").unwrap(), 0);
    assert_eq!(available(&manager, "P"), 5);
}

#[test]
fn test_terminal_states_reject_admin_transitions() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);

    for terminal in [OrderStatus::Cancelled, OrderStatus::Completed] {
        let order = manager.create_order(order_request(&[("P", 1)])).unwrap();
        manager.update_status(&order.id, terminal).unwrap();

        for next in OrderStatus::ALL {
            assert!(
                matches!(
                    manager.update_status(&order.id, next),
                    Err(ManagerError::OrderAlreadyFinalized(ref id)) if *id == order.id
                ),
                "{terminal} -> {next} should be rejected"
            );
        }
        assert_eq!(manager.get_order(&order.id).unwrap().status, terminal);
    }
}

#[test]
fn test_admin_flow_is_permissive() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 1)])).unwrap();

    // Skip straight to delivered, then correct back to pending
    let delivered = manager
        .update_status(&order.id, OrderStatus::Delivered)
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    let reverted = manager
        .update_status(&order.id, OrderStatus::Pending)
        .unwrap();
    assert_eq!(reverted.status, OrderStatus::Pending);
    assert_eq!(available(&manager, "P"), 4);
}

#[test]
fn test_admin_confirm_mints_rider_token_once() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 1)])).unwrap();

    let confirmed = manager
        .update_status(&order.id, OrderStatus::Confirm)
        .unwrap();
    let token = confirmed.rider_token.clone().unwrap();
    assert!(confirmed.qr_payload.is_some());

    let in_transit = manager
        .update_status(&order.id, OrderStatus::InTransit)
        .unwrap();
    assert_eq!(in_transit.rider_token.as_deref(), Some(token.as_str()));
}

#[test]
fn test_same_status_is_a_no_op() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 1)])).unwrap();
    let mut rx = manager.subscribe();

    let unchanged = manager
        .update_status(&order.id, OrderStatus::Pending)
        .unwrap();
    assert_eq!(unchanged, order);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_status_change_publishes_event() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 5);
    let order = manager.create_order(order_request(&[("P", 1)])).unwrap();
    let mut rx = manager.subscribe();

    manager
        .update_status(&order.id, OrderStatus::Confirm)
        .unwrap();

    let event = rx.try_recv().unwrap();
    assert_eq!(event.order_id, order.id);
    assert_eq!(
        event.kind,
        OrderEventKind::StatusChanged {
            from: OrderStatus::Pending,
            to: OrderStatus::Confirm,
            source: TransitionSource::Admin,
        }
    );
    assert_eq!(event.new_status(), Some(OrderStatus::Confirm));
}

#[test]
fn test_update_missing_order() {
    let manager = create_test_manager();
    assert!(matches!(
        manager.update_status("nope", OrderStatus::Confirm),
        Err(ManagerError::OrderNotFound(_))
    ));
}

#[test]
fn test_list_orders_paging() {
    let manager = create_test_manager();
    seed_product(&manager, "P", 100, 10);
    for _ in 0..3 {
        manager.create_order(order_request(&[("P", 1)])).unwrap();
    }

    assert_eq!(manager.list_orders(10, 0).unwrap().len(), 3);
    assert_eq!(manager.list_orders(2, 0).unwrap().len(), 2);
    assert_eq!(manager.list_orders(10, 2).unwrap().len(), 1);
    assert!(manager.list_orders(10, 5).unwrap().is_empty());
}

#[test]
fn test_restock_unknown_product() {
    let manager = create_test_manager();
    assert!(matches!(
        manager.restock("ghost", 3),
        Err(ManagerError::ProductNotFound(_))
    ));
    seed_product(&manager, "P", 100, 0);
    assert!(matches!(
        manager.restock("P", 0),
        Err(ManagerError::Validation(_))
    ));
    assert_eq!(manager.restock("P", 3).unwrap().available, 3);
}
