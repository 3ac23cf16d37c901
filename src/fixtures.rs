use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Delivery, Order, OrderItem, Payment};

// ============================================================================
// Test Fixtures - generated order documents
// ============================================================================
//
// Produces fully populated orders with unique ids for module tests. Kept
// out of the runtime binary; this is test tooling, not pipeline logic.
//
// ============================================================================

static SEQ: AtomicU64 = AtomicU64::new(1);

/// A complete order with three line items and a unique `order_uid`.
pub fn random_order() -> Order {
    let n = SEQ.fetch_add(1, Ordering::Relaxed);
    let track_number = format!("TR{n:07}");

    let items = (0..3i64)
        .map(|i| OrderItem {
            chrt_id: 9_000_000 + n as i64 * 10 + i,
            track_number: track_number.clone(),
            price: 450 + i * 25,
            rid: Uuid::new_v4().to_string(),
            name: format!("Product {n}-{i}"),
            sale: 30,
            size: "M".to_string(),
            total_price: 315 + i * 25,
            nm_id: 2_300_000 + n as i64 * 10 + i,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
        })
        .collect();

    Order {
        order_uid: format!("ORD-{n:07}"),
        track_number: track_number.clone(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: format!("Test Testov {n}"),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: format!("test{n}@gmail.com"),
        },
        payment: Payment {
            transaction: Uuid::new_v4().to_string(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: Utc::now().timestamp(),
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items,
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: format!("customer{n}"),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created: Some(Utc::now()),
        oof_shard: "1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_unique_orders() {
        let first = random_order();
        let second = random_order();

        assert_ne!(first.order_uid, second.order_uid);
        assert_eq!(first.items.len(), 3);
        assert!(!first.delivery.name.is_empty());
    }

    #[test]
    fn test_fields_filled() {
        let order = random_order();

        assert!(!order.track_number.is_empty());
        assert!(!order.entry.is_empty());
        assert!(order.payment.amount > 0);
        assert!(order.date_created.is_some());
    }
}
