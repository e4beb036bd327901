//! Select query builder.
//!
//! `SelectQuery<M>` builds a `SELECT * FROM <table>` statement and executes
//! it through a [`StoreExecutor`], mapping each row with [`FromRow`]. The
//! builder is pure: it only shapes the statement, and every call allocates a
//! fresh statement and parameter list, so concurrent callers can share the
//! builder logic freely.

use crate::executor::{StoreError, StoreExecutor};
use crate::query::error_handling::is_no_rows_error;
use crate::query::value_conversion::with_converted_params;
use may_postgres::Row;
use sea_query::{Expr, IntoColumnRef, IntoTableRef, Order, PostgresQueryBuilder, SelectStatement};
use std::marker::PhantomData;

/// Trait for types that can be created from a database row.
pub trait FromRow: Sized {
    /// Map one result row into `Self`.
    ///
    /// # Errors
    ///
    /// Returns the driver error when a mandatory column is absent or fails to
    /// decode. Optional columns are the implementation's business.
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error>;
}

/// Query builder for selecting records.
///
/// # Example
///
/// ```no_run
/// use storefront::catalog::product::Products;
/// use storefront::{Product, SelectQuery, StoreExecutor};
/// use sea_query::{Expr, ExprTrait, Order};
///
/// # fn example(executor: &impl StoreExecutor) -> Result<(), storefront::StoreError> {
/// let cheapest = SelectQuery::<Product>::new(Products::Table)
///     .filter(Expr::col("available").eq(true))
///     .order_by("price", Order::Asc)
///     .limit(10)
///     .all(executor)?;
/// # Ok(())
/// # }
/// ```
pub struct SelectQuery<M> {
    pub(crate) query: SelectStatement,
    _phantom: PhantomData<M>,
}

impl<M> SelectQuery<M>
where
    M: FromRow,
{
    /// Create a new `SELECT * FROM table` query. Callers pass their column
    /// enum's table variant so the table name has one source of truth.
    pub fn new<T: IntoTableRef>(table: T) -> Self {
        let mut query = SelectStatement::default();
        query.column(sea_query::Asterisk).from(table);
        Self {
            query,
            _phantom: PhantomData,
        }
    }

    /// Add a conjunctive (AND) filter condition.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.query.and_where(condition);
        self
    }

    /// Add an ORDER BY clause.
    pub fn order_by<C: IntoColumnRef>(mut self, column: C, order: Order) -> Self {
        self.query.order_by(column, order);
        self
    }

    /// Add a LIMIT clause.
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit(limit);
        self
    }

    /// Add an OFFSET clause.
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset(offset);
        self
    }

    /// Execute the query and return all results.
    ///
    /// # Errors
    ///
    /// Propagates storage errors unchanged; row-mapping failures surface as
    /// [`StoreError::ParseError`].
    pub fn all<E: StoreExecutor>(self, executor: &E) -> Result<Vec<M>, StoreError> {
        let (sql, values) = self.query.build(PostgresQueryBuilder);

        with_converted_params(&values, |params| {
            let rows = executor.query_all(&sql, params)?;

            let mut results = Vec::with_capacity(rows.len());
            for row in rows {
                let model = M::from_row(&row)
                    .map_err(|e| StoreError::ParseError(format!("Failed to parse row: {e}")))?;
                results.push(model);
            }
            Ok(results)
        })
    }

    /// Execute the query and return a single result.
    ///
    /// # Errors
    ///
    /// Returns an error if zero or more than one row comes back.
    pub fn one<E: StoreExecutor>(self, executor: &E) -> Result<M, StoreError> {
        let (sql, values) = self.query.build(PostgresQueryBuilder);

        with_converted_params(&values, |params| {
            let row = executor.query_one(&sql, params)?;
            M::from_row(&row)
                .map_err(|e| StoreError::ParseError(format!("Failed to parse row: {e}")))
        })
    }

    /// Execute the query and return the first result, or `None` when there is
    /// no match. Not-found is an empty result here, never an error; whether
    /// that becomes a 404 is the caller's decision.
    ///
    /// # Errors
    ///
    /// Propagates every storage error that is not a "no rows" condition.
    pub fn find_one<E: StoreExecutor>(self, executor: &E) -> Result<Option<M>, StoreError> {
        match self.one(executor) {
            Ok(model) => Ok(Some(model)),
            Err(e) => {
                if is_no_rows_error(&e) {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Execute a `SELECT COUNT(*)` over this query's predicates.
    ///
    /// The statement is wrapped as a subquery, so callers should not have set
    /// LIMIT or OFFSET on a query they intend to count.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; a non-integer count cell surfaces as
    /// [`StoreError::ParseError`].
    pub fn count<E: StoreExecutor>(self, executor: &E) -> Result<u64, StoreError> {
        let (sql, values) = self.query.build(PostgresQueryBuilder);
        let count_sql = format!("SELECT COUNT(*) FROM ({sql}) AS matched");

        with_converted_params(&values, |params| {
            let row = executor.query_one(&count_sql, params)?;
            let count: i64 = row
                .try_get(0)
                .map_err(|e| StoreError::ParseError(format!("Failed to read count: {e}")))?;
            Ok(count.max(0) as u64)
        })
    }
}
