//! Numeric identifier newtypes
//!
//! The backend hands out plain integers for every entity. Wrapping them keeps
//! a role id from being passed where a store id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Role identifier
    RoleId
);
numeric_id!(
    /// Permission identifier
    PermissionId
);
numeric_id!(
    /// Store identifier (scopes one hierarchy tree)
    StoreId
);
numeric_id!(
    /// Hierarchy edge identifier
    EdgeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&RoleId(7)).unwrap();
        assert_eq!(json, "7");

        let id: StoreId = serde_json::from_str("42").unwrap();
        assert_eq!(id, StoreId(42));
    }

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(StoreId(3).to_string(), "3");
        assert_eq!(EdgeId::from(9).get(), 9);
    }
}
