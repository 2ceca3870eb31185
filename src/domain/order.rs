use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const STATUS_PENDING: &str = "PENDING";

/// One `{product_id, quantity}` pair of an order submission.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A line whose unit price has been resolved against the store.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub total: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub client_id: Uuid,
    pub total: BigDecimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub details: Vec<OrderDetailView>,
}
