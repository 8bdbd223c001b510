//! 并发抢购测试 - 多个线程同时下单最后几件库存
//!
//! redb 只有一个写事务，预留 + 写订单在同一事务内，不会超卖。

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use order_server::OrdersManager;
use order_server::orders::ManagerError;
use rand::Rng;
use shared::models::{CatalogEntry, CustomerContact};
use shared::request::{CreateOrderRequest, OrderLineRequest};

const BUYERS: usize = 32;

fn manager(dir: &tempfile::TempDir) -> Arc<OrdersManager> {
    let manager = OrdersManager::new(dir.path().join("orders.redb"), Duration::from_secs(10))
        .unwrap();
    Arc::new(manager)
}

fn seed(manager: &OrdersManager, product_id: &str, stock: u64) {
    manager
        .upsert_catalog_entry(
            product_id,
            CatalogEntry {
                title: format!("Product {}", product_id),
                price: 999,
                image: String::new(),
            },
        )
        .unwrap();
    if stock > 0 {
        manager.restock(product_id, stock).unwrap();
    }
}

fn request(product_id: &str, quantity: u32, buyer: usize) -> CreateOrderRequest {
    CreateOrderRequest {
        contact: CustomerContact {
            name: format!("Buyer {}", buyer),
            phone: format!("600{:06}", buyer),
            address: "Calle Mayor 1".to_string(),
            postal_code: "28001".to_string(),
            email: format!("buyer{}@example.com", buyer),
        },
        lines: vec![OrderLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }],
    }
}

#[test]
fn test_last_unit_is_sold_once() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);
    seed(&manager, "P", 1);

    let barrier = Arc::new(Barrier::new(BUYERS));
    let handles: Vec<_> = (0..BUYERS)
        .map(|buyer| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.create_order(request("P", 1, buyer))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(
                result,
                Err(ManagerError::InsufficientStock { available: 0, requested: 1, .. })
            ),
            "unexpected result: {:?}",
            result
        );
    }

    assert_eq!(manager.stock_level("P").unwrap().unwrap().available, 0);
    assert_eq!(manager.list_orders(100, 0).unwrap().len(), 1);
}

#[test]
fn test_concurrent_create_and_delete_conserve_stock() {
    let dir = tempfile::tempdir().unwrap();
    let manager = manager(&dir);
    const STOCK: u64 = 40;
    seed(&manager, "P", STOCK);

    let barrier = Arc::new(Barrier::new(BUYERS));
    let handles: Vec<_> = (0..BUYERS)
        .map(|buyer| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let quantity = rand::thread_rng().gen_range(1..=3);
                barrier.wait();
                let Ok(order) = manager.create_order(request("P", quantity, buyer)) else {
                    return 0u64;
                };
                // 一半的订单立即删除，回补库存
                if buyer % 2 == 0 {
                    manager.delete_order(&order.id).unwrap();
                    0
                } else {
                    u64::from(quantity)
                }
            })
        })
        .collect();

    let kept: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let available = manager.stock_level("P").unwrap().unwrap().available;
    assert_eq!(available + kept, STOCK);
    assert_eq!(manager.ledger().reserved("P").unwrap(), kept);

    let stored: u64 = manager
        .list_orders(1000, 0)
        .unwrap()
        .iter()
        .map(|o| o.lines.iter().map(|l| u64::from(l.quantity)).sum::<u64>())
        .sum();
    assert_eq!(stored, kept);
}
