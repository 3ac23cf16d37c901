use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain Models
// ============================================================================
//
// The Order aggregate as it travels on the wire (Kafka messages and HTTP
// bodies) and into the durable store. Field names match the upstream JSON
// document format exactly.
//
// ============================================================================

// Every field is optional on the wire and defaults to its zero value;
// structural requirements are the validator's responsibility, not the
// decoder's.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<OrderItem>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i32,
    pub date_created: Option<DateTime<Utc>>,
    pub oof_shard: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct OrderItem {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    pub sale: i32,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}

impl Order {
    /// Fill in `date_created` with the current UTC time if the document
    /// arrived without one. Must run before validation, persistence, or
    /// caching so every stored snapshot carries a timestamp.
    pub fn ensure_date_created(&mut self) {
        if self.date_created.is_none() {
            self.date_created = Some(Utc::now());
        }
    }
}

/// The complete set of top-level keys an Order document may carry.
/// Used by the validate endpoint to reject unknown top-level fields.
pub const ORDER_TOP_LEVEL_FIELDS: &[&str] = &[
    "order_uid",
    "track_number",
    "entry",
    "delivery",
    "payment",
    "items",
    "locale",
    "internal_signature",
    "customer_id",
    "delivery_service",
    "shardkey",
    "sm_id",
    "date_created",
    "oof_shard",
];

// ============================================================================
// Unit Tests
// ============================================================================
