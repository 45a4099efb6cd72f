//! Newtype IDs for catalog entities.
//!
//! Products and wallets are both keyed by `SERIAL` columns, so without
//! newtypes a wallet ID could silently be used to look up a product.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares an `i32`-backed identifier.
///
/// The generated type is `Copy`, orders and hashes like its integer,
/// (de)serializes transparently and parses from a decimal string so it can be
/// read straight out of URL segments and form fields.
macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

catalog_id!(
    /// Identifier of a product in the catalog.
    ProductId
);

catalog_id!(
    /// Identifier of a payment wallet.
    WalletId
);
