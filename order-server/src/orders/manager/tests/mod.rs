use super::*;
use crate::rider::RiderGateway;
use shared::models::CustomerContact;
use shared::request::{CreateOrderRequest, OrderLineRequest};
use std::sync::Arc;

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::with_storage(storage)
}

fn create_test_gateway() -> (Arc<OrdersManager>, RiderGateway) {
    let manager = Arc::new(create_test_manager());
    let gateway = RiderGateway::new(manager.clone());
    (manager, gateway)
}

fn seed_product(manager: &OrdersManager, product_id: &str, price: i64, stock: u64) {
    manager
        .upsert_catalog_entry(
            product_id,
            CatalogEntry {
                title: format!("Product {}", product_id),
                price,
                image: format!("/img/{}.png", product_id),
            },
        )
        .unwrap();
    if stock > 0 {
        manager.restock(product_id, stock).unwrap();
    }
}

fn contact() -> CustomerContact {
    CustomerContact {
        name: "Ana García".to_string(),
        phone: "600111222".to_string(),
        address: "Calle Mayor 1".to_string(),
        postal_code: "28001".to_string(),
        email: "ana@example.com".to_string(),
    }
}

fn order_request(lines: &[(&str, u32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        contact: contact(),
        lines: lines
            .iter()
            .map(|(product_id, quantity)| OrderLineRequest {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

fn available(manager: &OrdersManager, product_id: &str) -> u64 {
    manager.stock_level(product_id).unwrap().unwrap().available
}

mod test_lifecycle;
