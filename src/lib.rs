//! # Storefront
//!
//! Catalog data-access layer for a small e-commerce backend, built on
//! `sea-query` statement building over a synchronous `may_postgres` client.
//!
//! The crate covers three concerns:
//! - translating a [`ProductFilter`] into a parameterized SELECT statement,
//! - deciding which products carry a currently-active flash promotion
//!   (evaluated against the storage clock, never the application clock),
//! - mapping result rows back into [`Product`] / [`Promotion`] entities,
//!   tolerating legacy column spellings.
//!
//! HTTP routing, authentication, and catalog management live in the calling
//! service; this crate only shapes and executes read queries, plus the two
//! stock-maintenance statements that enforce the non-negative stock rule.

pub mod catalog;
pub mod config;
pub mod connection;
pub mod executor;
pub mod query;
pub mod raw_sql;
pub mod response;

pub use catalog::{CatalogStats, Condition, Product, ProductFilter, Promotion, SortKey};
pub use connection::{connect, ConnectionError};
pub use executor::{MayPostgresExecutor, StoreError, StoreExecutor};
pub use query::{FromRow, SelectQuery};
pub use raw_sql::{execute_statement, find_by_statement, query_value};
pub use response::{ErrorResponse, ListResponse};
