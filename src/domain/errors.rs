use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Product {0} not found")]
    ProductNotFound(Uuid),

    #[error("Store error: {0}")]
    Store(String),

    /// The order header was committed but one or more detail rows were
    /// not. `failed_lines` holds the zero-based indices of the lines
    /// whose insert failed.
    #[error("Order {order_id} partially written: lines {failed_lines:?} failed")]
    PartialFailure {
        order_id: Uuid,
        failed_lines: Vec<usize>,
    },
}
