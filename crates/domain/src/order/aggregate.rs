//! The order aggregate.

use chrono::NaiveDateTime;
use common::{OrderId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Customer, Employee, Product, Shipper, ShippingAddress};

/// An order assembled from its row and every row it refers to.
///
/// Customer, employee, shipper, and shipping address are always present.
/// Related rows that are missing show up as empty descriptive fields,
/// never as an absent sub-object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by the store; ignored when adding an order.
    pub id: OrderId,
    pub customer: Customer,
    pub employee: Employee,
    pub order_date: NaiveDateTime,
    pub required_date: NaiveDateTime,
    pub shipped_date: Option<NaiveDateTime>,
    pub shipper: Shipper,
    /// Non-negative freight charge.
    pub freight: Decimal,
    pub ship_name: String,
    pub shipping_address: ShippingAddress,
    /// Detail lines, ordered by product id.
    pub details: Vec<OrderDetail>,
}

impl Order {
    /// Returns the number of detail lines.
    pub fn detail_count(&self) -> usize {
        self.details.len()
    }

    /// Returns the detail line for a product, if the order has one.
    pub fn detail(&self, product_id: ProductId) -> Option<&OrderDetail> {
        self.details.iter().find(|d| d.product.id == product_id)
    }
}

/// One line of an order, keyed by (order id, product id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    /// Back-reference to the owning order.
    pub order_id: OrderId,
    pub product: Product,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub discount: Decimal,
}

impl OrderDetail {
    /// Creates a line referring to a product by id, as supplied on writes.
    pub fn new(product_id: ProductId, unit_price: Decimal, quantity: i64, discount: Decimal) -> Self {
        Self {
            order_id: OrderId::default(),
            product: Product::reference(product_id),
            unit_price,
            quantity,
            discount,
        }
    }
}
