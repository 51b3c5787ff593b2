//! Value objects and reference views embedded in the order aggregate.

use std::str::FromStr;

use common::{CategoryId, EmployeeId, ProductId, ShipperId, SupplierId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a customer code.
pub const CUSTOMER_CODE_LEN: usize = 5;

/// Returned when a string is not a well-formed customer code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid customer code {0:?}: expected {CUSTOMER_CODE_LEN} ASCII letters or digits")]
pub struct InvalidCustomerCode(pub String);

/// Short fixed-format code identifying a customer (e.g. `ALFKI`).
///
/// Codes are five ASCII alphanumeric characters, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerCode(String);

impl CustomerCode {
    /// Parses and normalizes a customer code.
    pub fn parse(code: &str) -> Result<Self, InvalidCustomerCode> {
        let trimmed = code.trim();
        if trimmed.len() != CUSTOMER_CODE_LEN
            || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(InvalidCustomerCode(code.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Wraps a code read back from the store without validating it.
    pub(crate) fn from_stored(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerCode {
    type Err = InvalidCustomerCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CustomerCode {
    type Error = InvalidCustomerCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerCode> for String {
    fn from(code: CustomerCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CustomerCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The customer an order is placed for.
///
/// There is no customer table behind this: the company name is the order's
/// ship-to name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub code: CustomerCode,
    pub company_name: String,
}

impl Customer {
    pub fn new(code: CustomerCode, company_name: impl Into<String>) -> Self {
        Self {
            code,
            company_name: company_name.into(),
        }
    }
}

/// Employee who took the order. Descriptive fields are empty when the
/// employee row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
}

impl Employee {
    /// An employee known only by id, as supplied on writes.
    pub fn reference(id: EmployeeId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Shipper carrying the order. The company name is empty when the shipper
/// row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Shipper {
    pub id: ShipperId,
    pub company_name: String,
}

impl Shipper {
    /// A shipper known only by id, as supplied on writes.
    pub fn reference(id: ShipperId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Ship-to address. Owned by its order; has no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn new(
        address: impl Into<String>,
        city: impl Into<String>,
        region: Option<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            city: city.into(),
            region,
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }
}

/// Read-time view of the product on a detail line, carrying the display
/// names of its supplier and category alongside their ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub supplier_id: SupplierId,
    pub supplier: String,
    pub category_id: CategoryId,
    pub category: String,
}

impl Product {
    /// A product known only by id, as supplied on writes.
    pub fn reference(id: ProductId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}
