//! Persistence layer for the Northwind schema.
//!
//! Exposes the normalized rows (orders with their detail lines, employees,
//! shippers, products, suppliers, categories) through the [`NorthwindStore`]
//! trait. Every trait method is a single unit of work: writes that touch
//! several rows are applied atomically or not at all.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod row;
pub mod store;

pub use common::{CategoryId, EmployeeId, OrderId, ProductId, ShipperId, SupplierId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use query::OrderRange;
pub use row::{
    CategoryRow, EmployeeRow, OrderDetailRow, OrderRow, ProductRow, ShipperRow, SupplierRow,
};
pub use store::{NorthwindStore, validate_details};
