//! Shared types used across the store, domain, and API crates.

mod types;

pub use types::{CategoryId, EmployeeId, OrderId, ProductId, ShipperId, SupplierId};
