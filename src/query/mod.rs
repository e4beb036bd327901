//! Query building and execution.
//!
//! [`SelectQuery`] wraps a sea-query `SelectStatement` and executes it through
//! a [`crate::StoreExecutor`]. Filters are `Expr` conditions; values travel as
//! bound parameters through the `value_conversion` pass, never interpolated
//! into statement text.

pub mod select;
#[doc(inline)]
pub use select::{FromRow, SelectQuery};

pub(crate) mod error_handling;
pub(crate) mod value_conversion;
