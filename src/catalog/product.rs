//! Product entity, row mapping, and catalog finders.
//!
//! Row mapping tolerates two historical column-naming schemes for the same
//! concept: `stock` is preferred over `stock_quantity`, and `total_ratings`
//! over `rating_count`, taking the first non-missing value. Optional columns
//! default (numerics to zero, sets to empty) so entity invariants hold for
//! legacy rows; only a missing `id` is a mapping error.

use crate::catalog::filter::{Condition, ProductFilter};
use crate::catalog::promotion;
use crate::executor::{StoreError, StoreExecutor};
use crate::query::value_conversion::with_converted_params;
use crate::query::{FromRow, SelectQuery};
use crate::raw_sql::{execute_statement, find_by_statement};
use chrono::{DateTime, Utc};
use may_postgres::types::FromSql;
use may_postgres::Row;
use rust_decimal::Decimal;
use sea_query::{Expr, ExprTrait, Iden, PostgresQueryBuilder, Query};
use serde::Serialize;
use std::collections::BTreeSet;

/// Columns of the `products` table.
pub enum Products {
    Table,
    Id,
    Brand,
    Name,
    Price,
    ListPrice,
    Category,
    Gender,
    Condition,
    StockQuantity,
    Available,
    Rating,
    TotalRatings,
    Description,
    Sizes,
    Colors,
    Weight,
    Material,
    Origin,
    Warranty,
    CreatedAt,
    UpdatedAt,
}

impl Iden for Products {
    fn unquoted(&self) -> &str {
        match self {
            Products::Table => "products",
            Products::Id => "id",
            Products::Brand => "brand",
            Products::Name => "name",
            Products::Price => "price",
            Products::ListPrice => "list_price",
            Products::Category => "category",
            Products::Gender => "gender",
            Products::Condition => "condition",
            Products::StockQuantity => "stock_quantity",
            Products::Available => "available",
            Products::Rating => "rating",
            Products::TotalRatings => "total_ratings",
            Products::Description => "description",
            Products::Sizes => "sizes",
            Products::Colors => "colors",
            Products::Weight => "weight",
            Products::Material => "material",
            Products::Origin => "origin",
            Products::Warranty => "warranty",
            Products::CreatedAt => "created_at",
            Products::UpdatedAt => "updated_at",
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i32,
    pub brand: String,
    pub name: String,
    pub price: Decimal,
    pub list_price: Option<Decimal>,
    pub category: Option<String>,
    pub gender: Option<String>,
    pub condition: Option<Condition>,
    pub stock_quantity: i32,
    pub available: bool,
    pub rating: f64,
    pub total_ratings: i32,
    pub description: Option<String>,
    pub sizes: BTreeSet<String>,
    pub colors: BTreeSet<String>,
    pub weight: Option<String>,
    pub material: Option<String>,
    pub origin: Option<String>,
    pub warranty: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregate catalog figures.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub total_products: i64,
    pub in_stock: i64,
    pub out_of_stock: i64,
    /// Sum of `price * stock_quantity` over the whole catalog.
    pub inventory_value: Decimal,
}

/// Read a column that may be NULL or absent from the row entirely.
fn opt_col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Option<T> {
    row.try_get::<&str, Option<T>>(name).ok().flatten()
}

/// Split a comma-separated option list into a set, dropping blanks.
fn split_list(raw: Option<String>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl FromRow for Product {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        // The identifier is the one mandatory column.
        let id: i32 = row.try_get("id")?;

        let stock_quantity = opt_col::<i32>(row, "stock")
            .or_else(|| opt_col(row, "stock_quantity"))
            .unwrap_or(0);
        let total_ratings = opt_col::<i32>(row, "total_ratings")
            .or_else(|| opt_col(row, "rating_count"))
            .unwrap_or(0);

        Ok(Product {
            id,
            brand: opt_col(row, "brand").unwrap_or_default(),
            name: opt_col(row, "name").unwrap_or_default(),
            price: opt_col(row, "price").unwrap_or(Decimal::ZERO),
            list_price: opt_col(row, "list_price"),
            category: opt_col(row, "category"),
            gender: opt_col(row, "gender"),
            condition: opt_col::<String>(row, "condition")
                .as_deref()
                .and_then(Condition::parse),
            stock_quantity,
            available: opt_col(row, "available").unwrap_or(true),
            rating: opt_col(row, "rating").unwrap_or(0.0),
            total_ratings,
            description: opt_col(row, "description"),
            sizes: split_list(opt_col(row, "sizes")),
            colors: split_list(opt_col(row, "colors")),
            weight: opt_col(row, "weight"),
            material: opt_col(row, "material"),
            origin: opt_col(row, "origin"),
            warranty: opt_col(row, "warranty"),
            created_at: opt_col(row, "created_at"),
            updated_at: opt_col(row, "updated_at"),
        })
    }
}

impl Product {
    /// List products matching `filter`, in its sort order and page.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; zero matches is an empty `Vec`.
    pub fn search<E: StoreExecutor>(
        executor: &E,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, StoreError> {
        filter.to_query().all(executor)
    }

    /// Total number of rows matching `filter`, ignoring its pagination.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn count_matching<E: StoreExecutor>(
        executor: &E,
        filter: &ProductFilter,
    ) -> Result<u64, StoreError> {
        filter.to_count_query().count(executor)
    }

    /// Look up one product by identifier. Not-found is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn find_by_id<E: StoreExecutor>(
        executor: &E,
        id: i32,
    ) -> Result<Option<Product>, StoreError> {
        SelectQuery::new(Products::Table)
            .filter(Expr::col(Products::Id).eq(id))
            .find_one(executor)
    }

    /// Sellable products carrying a currently-active flash promotion:
    /// available, in stock, window live right now. Identifier-ascending.
    ///
    /// # Errors
    ///
    /// Propagates storage errors. A deployment missing the promotion table
    /// surfaces as [`StoreError::SchemaMismatch`], never as a different query.
    pub fn featured<E: StoreExecutor>(
        executor: &E,
        limit: Option<i64>,
    ) -> Result<Vec<Product>, StoreError> {
        let mut query = SelectQuery::new(Products::Table)
            .filter(Expr::col(Products::Available).eq(true))
            .filter(Expr::col(Products::StockQuantity).gt(0))
            .filter(promotion::active_window())
            .order_by(Products::Id, sea_query::Order::Asc);
        if let Some(limit) = limit {
            query = query.limit(limit.max(1) as u64);
        }
        query.all(executor)
    }

    /// Other available products from the same category as `product_id`, best
    /// rated first, falling back to the same brand when the product has no
    /// category. `limit` clamps to 1..=20. Unknown `product_id` yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn related<E: StoreExecutor>(
        executor: &E,
        product_id: i32,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError> {
        let Some(product) = Self::find_by_id(executor, product_id)? else {
            return Ok(Vec::new());
        };

        let peer_group = match product.category {
            Some(category) => Expr::col(Products::Category).eq(category),
            None => Expr::col(Products::Brand).eq(product.brand),
        };

        SelectQuery::new(Products::Table)
            .filter(peer_group)
            .filter(Expr::col(Products::Id).ne(product_id))
            .filter(Expr::col(Products::Available).eq(true))
            .order_by(Products::Rating, sea_query::Order::Desc)
            .order_by(Products::TotalRatings, sea_query::Order::Desc)
            .limit(limit.clamp(1, 20) as u64)
            .all(executor)
    }

    /// Aggregate catalog figures in a single round trip.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; a malformed aggregate row surfaces as
    /// [`StoreError::ParseError`].
    pub fn stats<E: StoreExecutor>(executor: &E) -> Result<CatalogStats, StoreError> {
        let row = find_by_statement(
            executor,
            "SELECT COUNT(*) AS total_products, \
                    COUNT(*) FILTER (WHERE stock_quantity > 0) AS in_stock, \
                    COUNT(*) FILTER (WHERE stock_quantity = 0) AS out_of_stock, \
                    COALESCE(SUM(price * stock_quantity), 0) AS inventory_value \
             FROM products",
            &[],
        )?;

        let count = |name: &str| -> Result<i64, StoreError> {
            row.try_get(name)
                .map_err(|e| StoreError::ParseError(format!("Failed to read {name}: {e}")))
        };

        Ok(CatalogStats {
            total_products: count("total_products")?,
            in_stock: count("in_stock")?,
            out_of_stock: count("out_of_stock")?,
            inventory_value: row.try_get("inventory_value").map_err(|e| {
                StoreError::ParseError(format!("Failed to read inventory_value: {e}"))
            })?,
        })
    }

    /// Set a product's stock quantity outright.
    ///
    /// # Errors
    ///
    /// Rejects negative quantities without touching storage; otherwise
    /// propagates storage errors. Returns the number of rows updated (0 when
    /// the product does not exist).
    pub fn set_stock<E: StoreExecutor>(
        executor: &E,
        id: i32,
        quantity: i32,
    ) -> Result<u64, StoreError> {
        if quantity < 0 {
            return Err(StoreError::Other(format!(
                "stock quantity cannot be negative (got {quantity})"
            )));
        }

        let (sql, values) = Query::update()
            .table(Products::Table)
            .value(Products::StockQuantity, quantity)
            .value(Products::UpdatedAt, Expr::cust("NOW()"))
            .and_where(Expr::col(Products::Id).eq(id))
            .build(PostgresQueryBuilder);

        with_converted_params(&values, |params| executor.execute(&sql, params))
    }

    /// Reduce a product's stock by `amount`, refusing to go below zero.
    ///
    /// The guard lives in the statement's WHERE clause, so a concurrent
    /// reduction cannot slip the quantity negative between a check and the
    /// write.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientStock`] when the remaining quantity cannot
    /// cover `amount`, a lookup error when the product does not exist, and
    /// storage errors otherwise.
    pub fn reduce_stock<E: StoreExecutor>(
        executor: &E,
        id: i32,
        amount: i32,
    ) -> Result<(), StoreError> {
        if amount <= 0 {
            return Err(StoreError::Other(format!(
                "stock reduction must be positive (got {amount})"
            )));
        }

        let affected = execute_statement(
            executor,
            "UPDATE products \
             SET stock_quantity = stock_quantity - $1, updated_at = NOW() \
             WHERE id = $2 AND stock_quantity >= $1",
            &[&amount, &id],
        )?;
        if affected > 0 {
            return Ok(());
        }

        match Self::find_by_id(executor, id)? {
            Some(product) => Err(StoreError::InsufficientStock {
                requested: amount,
                available: product.stock_quantity,
            }),
            None => Err(StoreError::QueryError(format!("product {id} not found"))),
        }
    }
}
