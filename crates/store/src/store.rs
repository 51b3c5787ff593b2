use std::collections::HashSet;

use async_trait::async_trait;

use crate::{
    CategoryId, CategoryRow, EmployeeId, EmployeeRow, OrderDetailRow, OrderId, OrderRange,
    OrderRow, ProductId, ProductRow, Result, ShipperId, ShipperRow, StoreError, SupplierId,
    SupplierRow,
};

/// Core trait for Northwind store implementations.
///
/// Lookups are single-or-none point queries by primary key. Every method is
/// its own unit of work: a multi-row write either applies completely or
/// leaves the store untouched. Nothing spans calls.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait NorthwindStore: Send + Sync {
    /// Loads an order with all of its detail rows.
    ///
    /// Returns None if the order doesn't exist.
    async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderRow>>;

    /// Returns the ids of the orders inside `range`, ascending.
    async fn query_order_ids(&self, range: OrderRange) -> Result<Vec<OrderId>>;

    /// Inserts an order and its detail rows.
    ///
    /// The store assigns the identity; `row.order_id` is ignored.
    /// Returns the new order id.
    async fn insert_order(&self, row: OrderRow) -> Result<OrderId>;

    /// Overwrites an order's columns and replaces its detail rows wholesale.
    ///
    /// Existing details are deleted and `row.details` inserted in their
    /// place. Fails with `NotFound` if the order doesn't exist.
    async fn update_order(&self, row: OrderRow) -> Result<()>;

    /// Deletes an order together with its detail rows.
    ///
    /// Fails with `NotFound` if the order doesn't exist.
    async fn delete_order(&self, order_id: OrderId) -> Result<()>;

    async fn find_employee(&self, employee_id: EmployeeId) -> Result<Option<EmployeeRow>>;

    /// Inserts the employee, or overwrites the row with the same id.
    async fn save_employee(&self, row: EmployeeRow) -> Result<()>;

    /// Returns whether a row was removed.
    async fn delete_employee(&self, employee_id: EmployeeId) -> Result<bool>;

    async fn find_shipper(&self, shipper_id: ShipperId) -> Result<Option<ShipperRow>>;

    async fn save_shipper(&self, row: ShipperRow) -> Result<()>;

    async fn delete_shipper(&self, shipper_id: ShipperId) -> Result<bool>;

    async fn find_product(&self, product_id: ProductId) -> Result<Option<ProductRow>>;

    async fn save_product(&self, row: ProductRow) -> Result<()>;

    async fn delete_product(&self, product_id: ProductId) -> Result<bool>;

    async fn find_supplier(&self, supplier_id: SupplierId) -> Result<Option<SupplierRow>>;

    async fn save_supplier(&self, row: SupplierRow) -> Result<()>;

    async fn delete_supplier(&self, supplier_id: SupplierId) -> Result<bool>;

    async fn find_category(&self, category_id: CategoryId) -> Result<Option<CategoryRow>>;

    async fn save_category(&self, row: CategoryRow) -> Result<()>;

    async fn delete_category(&self, category_id: CategoryId) -> Result<bool>;
}

/// Validates detail rows before they are written.
///
/// (order id, product id) is the detail key, so one order cannot list the
/// same product twice.
pub fn validate_details(details: &[OrderDetailRow]) -> Result<()> {
    let mut seen = HashSet::with_capacity(details.len());
    for detail in details {
        if !seen.insert(detail.product_id) {
            return Err(StoreError::Constraint(format!(
                "Duplicate order detail for product {}",
                detail.product_id
            )));
        }
    }
    Ok(())
}
