//! Order aggregate and related types.

mod aggregate;
mod mapping;
mod repository;
mod value_objects;

pub use aggregate::{Order, OrderDetail};
pub use repository::{DEFAULT_LIST_CONCURRENCY, OrderAggregateRepository, RepositoryConfig};
pub use value_objects::{
    CUSTOMER_CODE_LEN, Customer, CustomerCode, Employee, InvalidCustomerCode, Product, Shipper,
    ShippingAddress,
};
