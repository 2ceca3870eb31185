use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::order::OrderView;

/// Persistence contract consumed by the order placement workflow.
///
/// Each method is one store round-trip; the workflow sequences them and
/// owns all completion and partial-failure semantics.
pub trait OrderStore: Send + Sync + 'static {
    /// Current unit price of a product, or `None` when the product does
    /// not exist.
    fn fetch_unit_price(&self, product_id: Uuid) -> Result<Option<BigDecimal>, DomainError>;

    fn insert_order_header(
        &self,
        client_id: Uuid,
        total: &BigDecimal,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Uuid, DomainError>;

    fn insert_order_detail(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), DomainError>;

    fn orders_for_client(&self, client_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
}
