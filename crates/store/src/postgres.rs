use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    CategoryId, CategoryRow, EmployeeId, EmployeeRow, OrderDetailRow, OrderId, OrderRange,
    OrderRow, ProductId, ProductRow, Result, ShipperId, ShipperRow, StoreError, SupplierId,
    SupplierRow,
    store::{NorthwindStore, validate_details},
};

const ORDER_DETAILS_PKEY: &str = "order_details_pkey";

/// PostgreSQL-backed store implementation.
///
/// Multi-row writes run inside a transaction that is committed only when
/// every statement succeeded; any early return drops the transaction and
/// rolls it back.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<OrderRow> {
        Ok(OrderRow {
            order_id: OrderId::new(row.try_get("order_id")?),
            customer_id: row.try_get("customer_id")?,
            employee_id: EmployeeId::new(row.try_get("employee_id")?),
            order_date: row.try_get("order_date")?,
            required_date: row.try_get("required_date")?,
            shipped_date: row.try_get("shipped_date")?,
            ship_via: ShipperId::new(row.try_get("ship_via")?),
            freight: row.try_get("freight")?,
            ship_name: row.try_get("ship_name")?,
            ship_address: row.try_get("ship_address")?,
            ship_city: row.try_get("ship_city")?,
            ship_region: row.try_get("ship_region")?,
            ship_postal_code: row.try_get("ship_postal_code")?,
            ship_country: row.try_get("ship_country")?,
            details: Vec::new(),
        })
    }

    /// Reads the detail columns of a joined row; None when the join found no detail.
    fn row_to_detail(row: &PgRow, order_id: OrderId) -> Result<Option<OrderDetailRow>> {
        let Some(product_id) = row.try_get::<Option<i64>, _>("product_id")? else {
            return Ok(None);
        };

        Ok(Some(OrderDetailRow {
            order_id,
            product_id: ProductId::new(product_id),
            unit_price: row.try_get::<Option<Decimal>, _>("unit_price")?.unwrap_or_default(),
            quantity: row.try_get::<Option<i64>, _>("quantity")?.unwrap_or_default(),
            discount: row.try_get::<Option<Decimal>, _>("discount")?.unwrap_or_default(),
        }))
    }

    async fn insert_details(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        details: &[OrderDetailRow],
    ) -> Result<()> {
        for detail in details {
            sqlx::query(
                r#"
                INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id.as_i64())
            .bind(detail.product_id.as_i64())
            .bind(detail.unit_price)
            .bind(detail.quantity)
            .bind(detail.discount)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(ORDER_DETAILS_PKEY)
                {
                    return StoreError::Constraint(format!(
                        "Duplicate order detail for product {}",
                        detail.product_id
                    ));
                }
                StoreError::Database(e)
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl NorthwindStore for PostgresStore {
    async fn find_order(&self, order_id: OrderId) -> Result<Option<OrderRow>> {
        let rows = sqlx::query(
            r#"
            SELECT o.order_id, o.customer_id, o.employee_id, o.order_date, o.required_date,
                   o.shipped_date, o.ship_via, o.freight, o.ship_name, o.ship_address,
                   o.ship_city, o.ship_region, o.ship_postal_code, o.ship_country,
                   d.product_id, d.unit_price, d.quantity, d.discount
            FROM orders o
            LEFT JOIN order_details d ON d.order_id = o.order_id
            WHERE o.order_id = $1
            ORDER BY d.product_id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut order = Self::row_to_order(first)?;
        for row in &rows {
            if let Some(detail) = Self::row_to_detail(row, order_id)? {
                order.details.push(detail);
            }
        }

        Ok(Some(order))
    }

    async fn query_order_ids(&self, range: OrderRange) -> Result<Vec<OrderId>> {
        // LIMIT NULL is LIMIT ALL.
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT order_id FROM orders ORDER BY order_id ASC LIMIT $1 OFFSET $2")
                .bind(range.take.map(|t| t as i64))
                .bind(range.skip as i64)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().map(OrderId::new).collect())
    }

    async fn insert_order(&self, row: OrderRow) -> Result<OrderId> {
        validate_details(&row.details)?;

        let mut tx = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_id, employee_id, order_date, required_date, shipped_date,
                                ship_via, freight, ship_name, ship_address, ship_city, ship_region,
                                ship_postal_code, ship_country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING order_id
            "#,
        )
        .bind(&row.customer_id)
        .bind(row.employee_id.as_i64())
        .bind(row.order_date)
        .bind(row.required_date)
        .bind(row.shipped_date)
        .bind(row.ship_via.as_i64())
        .bind(row.freight)
        .bind(&row.ship_name)
        .bind(&row.ship_address)
        .bind(&row.ship_city)
        .bind(&row.ship_region)
        .bind(&row.ship_postal_code)
        .bind(&row.ship_country)
        .fetch_one(&mut *tx)
        .await?;

        let order_id = OrderId::new(order_id);
        Self::insert_details(&mut tx, order_id, &row.details).await?;

        tx.commit().await?;
        tracing::debug!(%order_id, details = row.details.len(), "inserted order");
        Ok(order_id)
    }

    async fn update_order(&self, row: OrderRow) -> Result<()> {
        validate_details(&row.details)?;

        let order_id = row.order_id;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $2, employee_id = $3, order_date = $4, required_date = $5,
                shipped_date = $6, ship_via = $7, freight = $8, ship_name = $9,
                ship_address = $10, ship_city = $11, ship_region = $12,
                ship_postal_code = $13, ship_country = $14
            WHERE order_id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .bind(&row.customer_id)
        .bind(row.employee_id.as_i64())
        .bind(row.order_date)
        .bind(row.required_date)
        .bind(row.shipped_date)
        .bind(row.ship_via.as_i64())
        .bind(row.freight)
        .bind(&row.ship_name)
        .bind(&row.ship_address)
        .bind(&row.ship_city)
        .bind(&row.ship_region)
        .bind(&row.ship_postal_code)
        .bind(&row.ship_country)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", order_id));
        }

        sqlx::query("DELETE FROM order_details WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        Self::insert_details(&mut tx, order_id, &row.details).await?;

        tx.commit().await?;
        tracing::debug!(%order_id, details = row.details.len(), "updated order");
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_details WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", order_id));
        }

        tx.commit().await?;
        tracing::debug!(%order_id, "deleted order");
        Ok(())
    }

    async fn find_employee(&self, employee_id: EmployeeId) -> Result<Option<EmployeeRow>> {
        let row = sqlx::query(
            "SELECT employee_id, first_name, last_name, country FROM employees WHERE employee_id = $1",
        )
        .bind(employee_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(EmployeeRow {
                employee_id: EmployeeId::new(row.try_get("employee_id")?),
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                country: row.try_get("country")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_employee(&self, row: EmployeeRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (employee_id, first_name, last_name, country)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (employee_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                country = EXCLUDED.country
            "#,
        )
        .bind(row.employee_id.as_i64())
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.country)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_employee(&self, employee_id: EmployeeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(employee_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_shipper(&self, shipper_id: ShipperId) -> Result<Option<ShipperRow>> {
        let row = sqlx::query(
            "SELECT shipper_id, company_name, phone FROM shippers WHERE shipper_id = $1",
        )
        .bind(shipper_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ShipperRow {
                shipper_id: ShipperId::new(row.try_get("shipper_id")?),
                company_name: row.try_get("company_name")?,
                phone: row.try_get("phone")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_shipper(&self, row: ShipperRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shippers (shipper_id, company_name, phone)
            VALUES ($1, $2, $3)
            ON CONFLICT (shipper_id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                phone = EXCLUDED.phone
            "#,
        )
        .bind(row.shipper_id.as_i64())
        .bind(&row.company_name)
        .bind(&row.phone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_shipper(&self, shipper_id: ShipperId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shippers WHERE shipper_id = $1")
            .bind(shipper_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<ProductRow>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, product_name, supplier_id, category_id, quantity_per_unit,
                   unit_price, units_in_stock, units_on_order, reorder_level, discontinued
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ProductRow {
                product_id: ProductId::new(row.try_get("product_id")?),
                product_name: row.try_get("product_name")?,
                supplier_id: SupplierId::new(row.try_get("supplier_id")?),
                category_id: CategoryId::new(row.try_get("category_id")?),
                quantity_per_unit: row.try_get("quantity_per_unit")?,
                unit_price: row.try_get("unit_price")?,
                units_in_stock: row.try_get("units_in_stock")?,
                units_on_order: row.try_get("units_on_order")?,
                reorder_level: row.try_get("reorder_level")?,
                discontinued: row.try_get("discontinued")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_product(&self, row: ProductRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, product_name, supplier_id, category_id,
                                  quantity_per_unit, unit_price, units_in_stock, units_on_order,
                                  reorder_level, discontinued)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (product_id) DO UPDATE SET
                product_name = EXCLUDED.product_name,
                supplier_id = EXCLUDED.supplier_id,
                category_id = EXCLUDED.category_id,
                quantity_per_unit = EXCLUDED.quantity_per_unit,
                unit_price = EXCLUDED.unit_price,
                units_in_stock = EXCLUDED.units_in_stock,
                units_on_order = EXCLUDED.units_on_order,
                reorder_level = EXCLUDED.reorder_level,
                discontinued = EXCLUDED.discontinued
            "#,
        )
        .bind(row.product_id.as_i64())
        .bind(&row.product_name)
        .bind(row.supplier_id.as_i64())
        .bind(row.category_id.as_i64())
        .bind(&row.quantity_per_unit)
        .bind(row.unit_price)
        .bind(row.units_in_stock)
        .bind(row.units_on_order)
        .bind(row.reorder_level)
        .bind(row.discontinued)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_supplier(&self, supplier_id: SupplierId) -> Result<Option<SupplierRow>> {
        let row = sqlx::query(
            r#"
            SELECT supplier_id, company_name, contact_name, city, country, phone
            FROM suppliers
            WHERE supplier_id = $1
            "#,
        )
        .bind(supplier_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(SupplierRow {
                supplier_id: SupplierId::new(row.try_get("supplier_id")?),
                company_name: row.try_get("company_name")?,
                contact_name: row.try_get("contact_name")?,
                city: row.try_get("city")?,
                country: row.try_get("country")?,
                phone: row.try_get("phone")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_supplier(&self, row: SupplierRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (supplier_id, company_name, contact_name, city, country, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (supplier_id) DO UPDATE SET
                company_name = EXCLUDED.company_name,
                contact_name = EXCLUDED.contact_name,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                phone = EXCLUDED.phone
            "#,
        )
        .bind(row.supplier_id.as_i64())
        .bind(&row.company_name)
        .bind(&row.contact_name)
        .bind(&row.city)
        .bind(&row.country)
        .bind(&row.phone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_supplier(&self, supplier_id: SupplierId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = $1")
            .bind(supplier_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_category(&self, category_id: CategoryId) -> Result<Option<CategoryRow>> {
        let row = sqlx::query(
            "SELECT category_id, category_name, description FROM categories WHERE category_id = $1",
        )
        .bind(category_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(CategoryRow {
                category_id: CategoryId::new(row.try_get("category_id")?),
                category_name: row.try_get("category_name")?,
                description: row.try_get("description")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_category(&self, row: CategoryRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (category_id, category_name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (category_id) DO UPDATE SET
                category_name = EXCLUDED.category_name,
                description = EXCLUDED.description
            "#,
        )
        .bind(row.category_id.as_i64())
        .bind(&row.category_name)
        .bind(&row.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_category(&self, category_id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(category_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
