//! Domain layer for the Northwind orders system.
//!
//! This crate provides:
//! - The `Order` aggregate with its customer, employee, shipper, shipping
//!   address, and detail lines
//! - Assembly of the aggregate from normalized store rows and flattening
//!   back into rows on write
//! - `OrderAggregateRepository`, the five read/write operations callers use

pub mod error;
pub mod order;

pub use error::RepositoryError;
pub use order::{
    Customer, CustomerCode, DEFAULT_LIST_CONCURRENCY, Employee, InvalidCustomerCode, Order,
    OrderAggregateRepository, OrderDetail, Product, RepositoryConfig, Shipper, ShippingAddress,
};
