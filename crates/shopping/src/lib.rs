//! Shopping list domain.
//!
//! Items, product lookup query rules and list totals. Pure logic only.

pub mod item;
pub mod query;
pub mod totals;

pub use item::{DEFAULT_CATEGORY, ProductInfo, ShoppingFilter, ShoppingItem, ShoppingPatch};
pub use query::ProductQuery;
pub use totals::{ExchangeRates, ShoppingTotals};
