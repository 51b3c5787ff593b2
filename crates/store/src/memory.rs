use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CategoryId, CategoryRow, EmployeeId, EmployeeRow, OrderId, OrderRange, OrderRow, ProductId,
    ProductRow, Result, ShipperId, ShipperRow, StoreError, SupplierId, SupplierRow,
    store::{NorthwindStore, validate_details},
};

#[derive(Debug, Default)]
struct Tables {
    orders: BTreeMap<OrderId, OrderRow>,
    last_order_id: i64,
    employees: HashMap<EmployeeId, EmployeeRow>,
    shippers: HashMap<ShipperId, ShipperRow>,
    products: HashMap<ProductId, ProductRow>,
    suppliers: HashMap<SupplierId, SupplierRow>,
    categories: HashMap<CategoryId, CategoryRow>,
    fail_on_write: bool,
}

impl Tables {
    fn check_writable(&self) -> Result<()> {
        if self.fail_on_write {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

/// In-memory store implementation for testing and local runs.
///
/// All tables sit behind a single lock, so every call observes and
/// produces a consistent snapshot, the same guarantee the PostgreSQL
/// implementation gets from its per-call transaction.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail as if the connection pool had timed out.
    pub async fn set_fail_on_write(&self, fail: bool) {
        self.tables.write().await.fail_on_write = fail;
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of detail rows across all orders.
    pub async fn detail_count(&self) -> usize {
        self.tables
            .read()
            .await
            .orders
            .values()
            .map(|o| o.details.len())
            .sum()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}

#[async_trait]
impl NorthwindStore for InMemoryStore {
    async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderRow>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.get(&order_id).cloned())
    }

    async fn query_order_ids(&self, range: OrderRange) -> Result<Vec<OrderId>> {
        let tables = self.tables.read().await;
        let ids = tables.orders.keys().copied().skip(range.skip);
        let ids = match range.take {
            Some(take) => ids.take(take).collect(),
            None => ids.collect(),
        };
        Ok(ids)
    }

    async fn insert_order(&self, row: OrderRow) -> Result<OrderId> {
        validate_details(&row.details)?;

        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        tables.last_order_id += 1;
        let order_id = OrderId::new(tables.last_order_id);

        let mut row = row.with_order_id(order_id);
        row.sort_details();
        tables.orders.insert(order_id, row);

        tracing::debug!(%order_id, "inserted order");
        Ok(order_id)
    }

    async fn update_order(&self, row: OrderRow) -> Result<()> {
        validate_details(&row.details)?;

        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        let order_id = row.order_id;
        let existing = tables
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::not_found("Order", order_id))?;

        // The whole row is swapped, which drops every previous detail line.
        let mut row = row.with_order_id(order_id);
        row.sort_details();
        *existing = row;

        tracing::debug!(%order_id, "updated order");
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        tables
            .orders
            .remove(&order_id)
            .ok_or_else(|| StoreError::not_found("Order", order_id))?;

        tracing::debug!(%order_id, "deleted order");
        Ok(())
    }

    async fn find_employee(&self, employee_id: EmployeeId) -> Result<Option<EmployeeRow>> {
        Ok(self.tables.read().await.employees.get(&employee_id).cloned())
    }

    async fn save_employee(&self, row: EmployeeRow) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.employees.insert(row.employee_id, row);
        Ok(())
    }

    async fn delete_employee(&self, employee_id: EmployeeId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.employees.remove(&employee_id).is_some())
    }

    async fn find_shipper(&self, shipper_id: ShipperId) -> Result<Option<ShipperRow>> {
        Ok(self.tables.read().await.shippers.get(&shipper_id).cloned())
    }

    async fn save_shipper(&self, row: ShipperRow) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.shippers.insert(row.shipper_id, row);
        Ok(())
    }

    async fn delete_shipper(&self, shipper_id: ShipperId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.shippers.remove(&shipper_id).is_some())
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<ProductRow>> {
        Ok(self.tables.read().await.products.get(&product_id).cloned())
    }

    async fn save_product(&self, row: ProductRow) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.products.insert(row.product_id, row);
        Ok(())
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.products.remove(&product_id).is_some())
    }

    async fn find_supplier(&self, supplier_id: SupplierId) -> Result<Option<SupplierRow>> {
        Ok(self.tables.read().await.suppliers.get(&supplier_id).cloned())
    }

    async fn save_supplier(&self, row: SupplierRow) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.suppliers.insert(row.supplier_id, row);
        Ok(())
    }

    async fn delete_supplier(&self, supplier_id: SupplierId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.suppliers.remove(&supplier_id).is_some())
    }

    async fn find_category(&self, category_id: CategoryId) -> Result<Option<CategoryRow>> {
        Ok(self.tables.read().await.categories.get(&category_id).cloned())
    }

    async fn save_category(&self, row: CategoryRow) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.categories.insert(row.category_id, row);
        Ok(())
    }

    async fn delete_category(&self, category_id: CategoryId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.categories.remove(&category_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::OrderDetailRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn create_test_order(details: Vec<OrderDetailRow>) -> OrderRow {
        OrderRow {
            order_id: OrderId::default(),
            customer_id: "ALFKI".to_string(),
            employee_id: EmployeeId::new(1),
            order_date: date(1997, 8, 25),
            required_date: date(1997, 9, 22),
            shipped_date: Some(date(1997, 9, 2)),
            ship_via: ShipperId::new(1),
            freight: dec!(29.46),
            ship_name: "Alfreds Futterkiste".to_string(),
            ship_address: "Obere Str. 57".to_string(),
            ship_city: "Berlin".to_string(),
            ship_region: None,
            ship_postal_code: "12209".to_string(),
            ship_country: "Germany".to_string(),
            details,
        }
    }

    fn detail(product_id: i64, quantity: i64) -> OrderDetailRow {
        OrderDetailRow::new(ProductId::new(product_id), dec!(10), quantity, dec!(0))
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();

        let first = store.insert_order(create_test_order(vec![])).await.unwrap();
        let second = store.insert_order(create_test_order(vec![])).await.unwrap();

        assert_eq!(first, OrderId::new(1));
        assert_eq!(second, OrderId::new(2));
    }

    #[tokio::test]
    async fn insert_ignores_caller_id_and_keys_details() {
        let store = InMemoryStore::new();
        let mut row = create_test_order(vec![detail(28, 15), detail(17, 2)]);
        row.order_id = OrderId::new(999);

        let order_id = store.insert_order(row).await.unwrap();
        assert_eq!(order_id, OrderId::new(1));

        let stored = store.find_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.order_id, order_id);
        assert!(stored.details.iter().all(|d| d.order_id == order_id));
        assert_eq!(stored.details[0].product_id, ProductId::new(17));
        assert_eq!(stored.details[1].product_id, ProductId::new(28));
        assert!(store.find_order(OrderId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_products() {
        let store = InMemoryStore::new();
        let row = create_test_order(vec![detail(7, 1), detail(7, 2)]);

        let result = store.insert_order(row).await;

        assert!(matches!(result, Err(StoreError::Constraint(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn update_replaces_all_details() {
        let store = InMemoryStore::new();
        let order_id = store
            .insert_order(create_test_order(vec![detail(1, 1), detail(2, 2), detail(3, 3)]))
            .await
            .unwrap();

        let mut row = create_test_order(vec![detail(4, 9)]);
        row.order_id = order_id;
        row.freight = dec!(1.25);
        store.update_order(row).await.unwrap();

        let stored = store.find_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.freight, dec!(1.25));
        assert_eq!(stored.details.len(), 1);
        assert_eq!(stored.details[0].product_id, ProductId::new(4));
        assert_eq!(store.detail_count().await, 1);
    }

    #[tokio::test]
    async fn update_missing_order_is_not_found() {
        let store = InMemoryStore::new();
        let mut row = create_test_order(vec![]);
        row.order_id = OrderId::new(42);

        let result = store.update_order(row).await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_order_and_details() {
        let store = InMemoryStore::new();
        let order_id = store
            .insert_order(create_test_order(vec![detail(1, 1)]))
            .await
            .unwrap();

        store.delete_order(order_id).await.unwrap();

        assert!(store.find_order(order_id).await.unwrap().is_none());
        assert_eq!(store.detail_count().await, 0);
        assert!(matches!(
            store.delete_order(order_id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = InMemoryStore::new();
        let first = store.insert_order(create_test_order(vec![])).await.unwrap();
        store.delete_order(first).await.unwrap();

        let second = store.insert_order(create_test_order(vec![])).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn query_order_ids_applies_range() {
        let store = InMemoryStore::new();
        for _ in 0..5 {
            store.insert_order(create_test_order(vec![])).await.unwrap();
        }

        let all = store.query_order_ids(OrderRange::new()).await.unwrap();
        assert_eq!(all.len(), 5);

        let window = store
            .query_order_ids(OrderRange::new().skip(1).take(2))
            .await
            .unwrap();
        assert_eq!(window, vec![OrderId::new(2), OrderId::new(3)]);

        let past_end = store
            .query_order_ids(OrderRange::new().skip(10).take(2))
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn reference_rows_save_find_delete() {
        let store = InMemoryStore::new();
        let employee = EmployeeRow {
            employee_id: EmployeeId::new(5),
            first_name: "Steven".to_string(),
            last_name: "Buchanan".to_string(),
            country: "UK".to_string(),
        };

        store.save_employee(employee.clone()).await.unwrap();
        assert_eq!(
            store.find_employee(EmployeeId::new(5)).await.unwrap(),
            Some(employee)
        );

        assert!(store.delete_employee(EmployeeId::new(5)).await.unwrap());
        assert!(!store.delete_employee(EmployeeId::new(5)).await.unwrap());
        assert!(store.find_employee(EmployeeId::new(5)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_existing_row() {
        let store = InMemoryStore::new();
        let mut shipper = ShipperRow {
            shipper_id: ShipperId::new(1),
            company_name: "Speedy Express".to_string(),
            phone: "(503) 555-9831".to_string(),
        };
        store.save_shipper(shipper.clone()).await.unwrap();

        shipper.company_name = "Speedy Express Ltd".to_string();
        store.save_shipper(shipper).await.unwrap();

        let stored = store.find_shipper(ShipperId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored.company_name, "Speedy Express Ltd");
    }

    #[tokio::test]
    async fn failed_write_leaves_store_untouched() {
        let store = InMemoryStore::new();
        store.set_fail_on_write(true).await;

        let result = store.insert_order(create_test_order(vec![detail(1, 1)])).await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert_eq!(store.order_count().await, 0);

        store.set_fail_on_write(false).await;
        assert!(store.insert_order(create_test_order(vec![])).await.is_ok());
    }
}
