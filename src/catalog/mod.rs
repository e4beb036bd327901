//! Catalog domain: products, flash promotions, and the filter that queries
//! them.

pub mod filter;
pub mod product;
pub mod promotion;

pub use filter::{Condition, ProductFilter, SortKey};
pub use product::{CatalogStats, Product};
pub use promotion::Promotion;
