//! Repository error types.

use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors reported by the order aggregate repository.
///
/// Every failed operation reports exactly one of these kinds.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The order does not exist, or no order was supplied to an update.
    #[error("{}", not_found_message(.order_id))]
    OrderNotFound { order_id: Option<OrderId> },

    /// Pagination parameters out of range.
    #[error("Invalid arguments: skip must be >= 0 and count > 0 (skip={skip}, count={count})")]
    InvalidArgument { skip: i64, count: i64 },

    /// A detail line references a product missing from the store.
    #[error("Order {order_id} references product {product_id}, which does not exist")]
    InvalidReference {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// The store failed; the original error is kept as the source.
    #[error("Repository failure: {0}")]
    Failure(#[from] StoreError),
}

impl RepositoryError {
    pub(crate) fn order_not_found(order_id: OrderId) -> Self {
        Self::OrderNotFound {
            order_id: Some(order_id),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderNotFound { .. } => "order_not_found",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::InvalidReference { .. } => "invalid_reference",
            Self::Failure(_) => "repository_failure",
        }
    }
}

fn not_found_message(order_id: &Option<OrderId>) -> String {
    match order_id {
        Some(id) => format!("Order with ID {id} not found"),
        None => "Order not found".to_string(),
    }
}
