//! Primitive single-table rows as the store persists them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, EmployeeId, OrderId, ProductId, ShipperId, SupplierId};

/// A row of the `orders` table together with its `order_details` rows.
///
/// Details are embedded because they have no life of their own: they are
/// loaded, inserted, replaced, and deleted together with their order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    /// Ignored on insert; the store assigns the identity.
    pub order_id: OrderId,
    pub customer_id: String,
    pub employee_id: EmployeeId,
    pub order_date: NaiveDateTime,
    pub required_date: NaiveDateTime,
    pub shipped_date: Option<NaiveDateTime>,
    /// The shipper carrying the order.
    pub ship_via: ShipperId,
    pub freight: Decimal,
    pub ship_name: String,
    pub ship_address: String,
    pub ship_city: String,
    pub ship_region: Option<String>,
    pub ship_postal_code: String,
    pub ship_country: String,
    /// Detail lines, ordered by ascending product id when read back.
    pub details: Vec<OrderDetailRow>,
}

impl OrderRow {
    /// Returns a copy of this row re-keyed to `order_id`, including its details.
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        for detail in &mut self.details {
            detail.order_id = order_id;
        }
        self
    }

    /// Sorts the detail lines into their canonical read order.
    pub fn sort_details(&mut self) {
        self.details.sort_by_key(|d| d.product_id);
    }
}

/// A row of the `order_details` table, keyed by (order id, product id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetailRow {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub discount: Decimal,
}

impl OrderDetailRow {
    /// Creates a detail line for a not-yet-keyed order.
    ///
    /// The order id is filled in by the store when the owning order is written.
    pub fn new(product_id: ProductId, unit_price: Decimal, quantity: i64, discount: Decimal) -> Self {
        Self {
            order_id: OrderId::default(),
            product_id,
            unit_price,
            quantity,
            discount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRow {
    pub employee_id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipperRow {
    pub shipper_id: ShipperId,
    pub company_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: ProductId,
    pub product_name: String,
    pub supplier_id: SupplierId,
    pub category_id: CategoryId,
    pub quantity_per_unit: String,
    pub unit_price: Decimal,
    pub units_in_stock: i64,
    pub units_on_order: i64,
    pub reorder_level: i64,
    pub discontinued: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRow {
    pub supplier_id: SupplierId,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub category_id: CategoryId,
    pub category_name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order_row(details: Vec<OrderDetailRow>) -> OrderRow {
        let date = chrono::NaiveDate::from_ymd_opt(1996, 7, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        OrderRow {
            order_id: OrderId::default(),
            customer_id: "VINET".to_string(),
            employee_id: EmployeeId::new(5),
            order_date: date,
            required_date: date,
            shipped_date: None,
            ship_via: ShipperId::new(3),
            freight: dec!(32.38),
            ship_name: "Vins et alcools Chevalier".to_string(),
            ship_address: "59 rue de l'Abbaye".to_string(),
            ship_city: "Reims".to_string(),
            ship_region: None,
            ship_postal_code: "51100".to_string(),
            ship_country: "France".to_string(),
            details,
        }
    }

    #[test]
    fn with_order_id_rekeys_details() {
        let row = order_row(vec![
            OrderDetailRow::new(ProductId::new(11), dec!(14), 12, dec!(0)),
            OrderDetailRow::new(ProductId::new(42), dec!(9.8), 10, dec!(0)),
        ])
        .with_order_id(OrderId::new(10248));

        assert_eq!(row.order_id, OrderId::new(10248));
        assert!(row.details.iter().all(|d| d.order_id == OrderId::new(10248)));
    }

    #[test]
    fn sort_details_orders_by_product() {
        let mut row = order_row(vec![
            OrderDetailRow::new(ProductId::new(72), dec!(34.8), 5, dec!(0)),
            OrderDetailRow::new(ProductId::new(11), dec!(14), 12, dec!(0)),
        ]);
        row.sort_details();

        let products: Vec<_> = row.details.iter().map(|d| d.product_id).collect();
        assert_eq!(products, vec![ProductId::new(11), ProductId::new(72)]);
    }
}
