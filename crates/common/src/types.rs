use serde::{Deserialize, Serialize};

/// Declares an integer primary-key newtype.
///
/// Every table in the schema keys its rows by a plain integer. Wrapping
/// each one keeps an employee id from being passed where a shipper id is
/// expected.
macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

integer_id!(
    /// Identity of an order. Assigned by the store on insert and immutable afterwards.
    OrderId
);
integer_id!(
    /// Identity of an employee row.
    EmployeeId
);
integer_id!(
    /// Identity of a shipper row (the order's `ship_via` column).
    ShipperId
);
integer_id!(
    /// Identity of a product row.
    ProductId
);
integer_id!(
    /// Identity of a supplier row.
    SupplierId
);
integer_id!(
    /// Identity of a category row.
    CategoryId
);
