//! Order aggregate repository.

use std::time::Instant;

use common::OrderId;
use futures_util::{StreamExt, TryStreamExt, stream};
use store::{NorthwindStore, OrderDetailRow, OrderRange, OrderRow, StoreError};

use crate::error::RepositoryError;

use super::mapping::{assemble_detail, assemble_order, disassemble_order};
use super::{Order, OrderDetail};

/// Default number of orders assembled concurrently by [`OrderAggregateRepository::get_orders`].
pub const DEFAULT_LIST_CONCURRENCY: usize = 4;

/// Tuning for the repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// How many list elements are assembled at once. Output order is
    /// unaffected.
    pub list_concurrency: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            list_concurrency: DEFAULT_LIST_CONCURRENCY,
        }
    }
}

/// Reads and writes whole order aggregates over a [`NorthwindStore`].
///
/// Reads resolve every reference with a point lookup: employee and shipper
/// per order, then product, supplier, and category per detail line. A
/// missing product fails the read; any other missing row leaves empty
/// fields. Writes flatten the aggregate into rows and hand each one to a
/// single store call, so the store's per-call transaction covers the whole
/// write.
pub struct OrderAggregateRepository<S: NorthwindStore> {
    store: S,
    config: RepositoryConfig,
}

impl<S: NorthwindStore> OrderAggregateRepository<S> {
    /// Creates a repository with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, RepositoryConfig::default())
    }

    pub fn with_config(store: S, config: RepositoryConfig) -> Self {
        Self { store, config }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads and assembles one order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let result = self.load(order_id).await;
        record("get_order", &result);
        result
    }

    /// Loads a page of orders ordered by ascending id.
    ///
    /// Each element is assembled exactly as [`get_order`](Self::get_order)
    /// would. Fails with `InvalidArgument` unless `skip >= 0` and `count > 0`.
    #[tracing::instrument(skip(self))]
    pub async fn get_orders(&self, skip: i64, count: i64) -> Result<Vec<Order>, RepositoryError> {
        let result = self.list(skip, count).await;
        record("get_orders", &result);
        result
    }

    /// Inserts a new order with its detail lines and returns the id the
    /// store assigned. Any id on `order` is ignored.
    #[tracing::instrument(skip(self, order), fields(customer = %order.customer.code))]
    pub async fn add_order(&self, order: Order) -> Result<OrderId, RepositoryError> {
        let row = disassemble_order(&order);
        let result = self
            .store
            .insert_order(row)
            .await
            .map_err(RepositoryError::Failure);

        if let Ok(order_id) = &result {
            tracing::info!(%order_id, details = order.details.len(), "order added");
        }
        record("add_order", &result);
        result
    }

    /// Overwrites an existing order and replaces its detail lines wholesale.
    ///
    /// Lines missing from `order` are deleted even if they were otherwise
    /// unchanged. `None` is reported as `OrderNotFound`. There is no
    /// concurrency check: the last writer wins.
    #[tracing::instrument(skip(self, order))]
    pub async fn update_order(&self, order: Option<Order>) -> Result<(), RepositoryError> {
        let result = self.replace(order).await;
        record("update_order", &result);
        result
    }

    /// Deletes an order together with its detail lines.
    #[tracing::instrument(skip(self))]
    pub async fn remove_order(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let result = self.remove(order_id).await;
        record("remove_order", &result);
        result
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let row = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| RepositoryError::order_not_found(order_id))?;

        self.assemble(row).await
    }

    async fn list(&self, skip: i64, count: i64) -> Result<Vec<Order>, RepositoryError> {
        let invalid = || RepositoryError::InvalidArgument { skip, count };
        if skip < 0 || count <= 0 {
            return Err(invalid());
        }
        let range = OrderRange::new()
            .skip(usize::try_from(skip).map_err(|_| invalid())?)
            .take(usize::try_from(count).map_err(|_| invalid())?);

        let ids = self.store.query_order_ids(range).await?;

        stream::iter(ids)
            .map(|order_id| self.load(order_id))
            .buffered(self.config.list_concurrency.max(1))
            .try_collect()
            .await
    }

    async fn replace(&self, order: Option<Order>) -> Result<(), RepositoryError> {
        let Some(order) = order else {
            return Err(RepositoryError::OrderNotFound { order_id: None });
        };
        let order_id = order.id;

        if self.store.find_order(order_id).await?.is_none() {
            return Err(RepositoryError::order_not_found(order_id));
        }

        self.store
            .update_order(disassemble_order(&order))
            .await
            .map_err(|e| not_found_or_failure(e, order_id))?;

        tracing::info!(%order_id, details = order.details.len(), "order updated");
        Ok(())
    }

    async fn remove(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        if self.store.find_order(order_id).await?.is_none() {
            return Err(RepositoryError::order_not_found(order_id));
        }

        self.store
            .delete_order(order_id)
            .await
            .map_err(|e| not_found_or_failure(e, order_id))?;

        tracing::info!(%order_id, "order removed");
        Ok(())
    }

    async fn assemble(&self, mut row: OrderRow) -> Result<Order, RepositoryError> {
        let started = Instant::now();

        let employee = self.store.find_employee(row.employee_id).await?;
        if employee.is_none() {
            tracing::debug!(order_id = %row.order_id, employee_id = %row.employee_id, "employee not found");
        }
        let shipper = self.store.find_shipper(row.ship_via).await?;
        if shipper.is_none() {
            tracing::debug!(order_id = %row.order_id, shipper_id = %row.ship_via, "shipper not found");
        }

        let detail_rows = std::mem::take(&mut row.details);
        let mut details = Vec::with_capacity(detail_rows.len());
        for detail in &detail_rows {
            details.push(self.assemble_detail(detail).await?);
        }

        let order = assemble_order(row, employee, shipper, details);
        metrics::histogram!("order_assembly_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(order)
    }

    async fn assemble_detail(&self, row: &OrderDetailRow) -> Result<OrderDetail, RepositoryError> {
        let product = self.store.find_product(row.product_id).await?.ok_or(
            RepositoryError::InvalidReference {
                order_id: row.order_id,
                product_id: row.product_id,
            },
        )?;

        let supplier = self.store.find_supplier(product.supplier_id).await?;
        let category = self.store.find_category(product.category_id).await?;

        Ok(assemble_detail(row, product, supplier, category))
    }
}

/// A write that lost a race with a delete reports the order as missing.
fn not_found_or_failure(err: StoreError, order_id: OrderId) -> RepositoryError {
    match err {
        StoreError::NotFound { .. } => RepositoryError::order_not_found(order_id),
        other => RepositoryError::Failure(other),
    }
}

fn record<T>(operation: &'static str, result: &Result<T, RepositoryError>) {
    match result {
        Ok(_) => {
            metrics::counter!("order_repository_operations_total", "operation" => operation)
                .increment(1);
        }
        Err(err) => {
            tracing::warn!(operation, error = %err, "order repository operation failed");
            metrics::counter!(
                "order_repository_failures_total",
                "operation" => operation,
                "kind" => err.kind()
            )
            .increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common::{CategoryId, EmployeeId, ProductId, ShipperId, SupplierId};
    use rust_decimal_macros::dec;
    use store::{InMemoryStore, ProductRow};

    use super::*;
    use crate::order::{Customer, CustomerCode, Employee, Shipper, ShippingAddress};

    fn test_order(details: Vec<OrderDetail>) -> Order {
        let date = NaiveDate::from_ymd_opt(1998, 5, 6)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Order {
            id: OrderId::default(),
            customer: Customer::new(CustomerCode::parse("ALFKI").unwrap(), ""),
            employee: Employee::reference(EmployeeId::new(1)),
            order_date: date,
            required_date: date,
            shipped_date: None,
            shipper: Shipper::reference(ShipperId::new(1)),
            freight: dec!(10.5),
            ship_name: "Alfreds Futterkiste".to_string(),
            shipping_address: ShippingAddress::new(
                "Obere Str. 57",
                "Berlin",
                None,
                "12209",
                "Germany",
            ),
            details,
        }
    }

    async fn seed_product(store: &InMemoryStore, id: i64) {
        store
            .save_product(ProductRow {
                product_id: ProductId::new(id),
                product_name: format!("Product {id}"),
                supplier_id: SupplierId::new(1),
                category_id: CategoryId::new(1),
                quantity_per_unit: String::new(),
                unit_price: dec!(1),
                units_in_stock: 0,
                units_on_order: 0,
                reorder_level: 0,
                discontinued: false,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_and_get_order() {
        let store = InMemoryStore::new();
        seed_product(&store, 7).await;
        let repository = OrderAggregateRepository::new(store);

        let order_id = repository
            .add_order(test_order(vec![OrderDetail::new(
                ProductId::new(7),
                dec!(2.5),
                3,
                dec!(0),
            )]))
            .await
            .unwrap();

        let order = repository.get_order(order_id).await.unwrap();
        assert_eq!(order.id, order_id);
        assert_eq!(order.freight, dec!(10.5));
        assert_eq!(order.detail_count(), 1);
        assert_eq!(order.details[0].quantity, 3);
        assert_eq!(order.details[0].product.name, "Product 7");
    }

    #[tokio::test]
    async fn test_get_missing_order() {
        let repository = OrderAggregateRepository::new(InMemoryStore::new());

        let result = repository.get_order(OrderId::new(1)).await;

        assert!(matches!(
            result,
            Err(RepositoryError::OrderNotFound {
                order_id: Some(id)
            }) if id == OrderId::new(1)
        ));
    }

    #[tokio::test]
    async fn test_missing_product_is_invalid_reference() {
        let repository = OrderAggregateRepository::new(InMemoryStore::new());
        let order_id = repository
            .add_order(test_order(vec![OrderDetail::new(
                ProductId::new(99),
                dec!(1),
                1,
                dec!(0),
            )]))
            .await
            .unwrap();

        let result = repository.get_order(order_id).await;

        assert!(matches!(
            result,
            Err(RepositoryError::InvalidReference { product_id, .. }) if product_id == ProductId::new(99)
        ));
    }

    #[tokio::test]
    async fn test_update_with_none_is_not_found() {
        let repository = OrderAggregateRepository::new(InMemoryStore::new());

        let result = repository.update_order(None).await;

        assert!(matches!(
            result,
            Err(RepositoryError::OrderNotFound { order_id: None })
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_order() {
        let repository = OrderAggregateRepository::new(InMemoryStore::new());

        let result = repository.remove_order(OrderId::new(5)).await;

        assert!(matches!(result, Err(RepositoryError::OrderNotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_orders_rejects_invalid_arguments() {
        let repository = OrderAggregateRepository::new(InMemoryStore::new());

        for (skip, count) in [(-1, 10), (0, 0), (0, -5)] {
            let result = repository.get_orders(skip, count).await;
            assert!(
                matches!(result, Err(RepositoryError::InvalidArgument { .. })),
                "skip={skip} count={count}"
            );
        }
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_lists() {
        let store = InMemoryStore::new();
        let repository = OrderAggregateRepository::with_config(
            store,
            RepositoryConfig {
                list_concurrency: 0,
            },
        );
        repository.add_order(test_order(vec![])).await.unwrap();

        let orders = repository.get_orders(0, 10).await.unwrap();

        assert_eq!(orders.len(), 1);
    }
}
