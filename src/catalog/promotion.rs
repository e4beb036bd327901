//! Flash promotions and the active-window predicate.
//!
//! A promotion is live when its active flag is set AND the current instant
//! lies within `[starts_at, ends_at]`, inclusive on both ends. "Current
//! instant" is always the database server's clock (`NOW()`), never the
//! application clock, so both sides of each comparison share one time source.
//! Timestamps are stored as `timestamptz` and compared in UTC.

use crate::catalog::product::Products;
use crate::executor::{StoreError, StoreExecutor};
use crate::query::{FromRow, SelectQuery};
use crate::raw_sql::query_value;
use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use sea_query::{Expr, ExprTrait, Iden, Query};
use serde::Serialize;

/// Columns of the `flash_promotions` table.
pub enum Promotions {
    Table,
    Id,
    ProductId,
    Name,
    DiscountPercent,
    PromoPrice,
    OriginalPrice,
    StartsAt,
    EndsAt,
    Active,
    UsageLimit,
    UsedCount,
}

impl Iden for Promotions {
    fn unquoted(&self) -> &str {
        match self {
            Promotions::Table => "flash_promotions",
            Promotions::Id => "id",
            Promotions::ProductId => "product_id",
            Promotions::Name => "name",
            Promotions::DiscountPercent => "discount_percent",
            Promotions::PromoPrice => "promo_price",
            Promotions::OriginalPrice => "original_price",
            Promotions::StartsAt => "starts_at",
            Promotions::EndsAt => "ends_at",
            Promotions::Active => "active",
            Promotions::UsageLimit => "usage_limit",
            Promotions::UsedCount => "used_count",
        }
    }
}

/// Predicate: the surrounding product row has at least one currently-active
/// promotion.
///
/// Expressed as a correlated EXISTS rather than a join, so a product with
/// several matching promotion rows still appears once. The predicate stays
/// correct even if the at-most-one-active-promotion convention is violated.
pub fn active_window() -> Expr {
    Expr::exists(
        Query::select()
            .expr(Expr::val(1))
            .from(Promotions::Table)
            .and_where(
                Expr::col((Promotions::Table, Promotions::ProductId))
                    .equals((Products::Table, Products::Id)),
            )
            .and_where(Expr::col((Promotions::Table, Promotions::Active)).eq(true))
            .and_where(Expr::col((Promotions::Table, Promotions::StartsAt)).lte(Expr::cust("NOW()")))
            .and_where(Expr::col((Promotions::Table, Promotions::EndsAt)).gte(Expr::cust("NOW()")))
            .take(),
    )
}

/// A time-bounded discount attached to one product.
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub discount_percent: Option<Decimal>,
    pub promo_price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
}

impl FromRow for Promotion {
    fn from_row(row: &Row) -> Result<Self, may_postgres::Error> {
        Ok(Promotion {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            name: row
                .try_get::<&str, Option<String>>("name")?
                .unwrap_or_default(),
            discount_percent: row.try_get("discount_percent")?,
            promo_price: row.try_get("promo_price")?,
            original_price: row.try_get("original_price")?,
            starts_at: row.try_get("starts_at")?,
            ends_at: row.try_get("ends_at")?,
            active: row.try_get("active")?,
            usage_limit: row.try_get("usage_limit")?,
            used_count: row
                .try_get::<&str, Option<i32>>("used_count")?
                .unwrap_or(0),
        })
    }
}

impl Promotion {
    /// Whether this promotion is live at `instant`. Both window bounds are
    /// inclusive, and the active flag gates the window entirely.
    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= instant && instant <= self.ends_at
    }

    /// The currently-active promotion for one product, or `None`.
    ///
    /// If the at-most-one convention is violated, the latest-starting one
    /// wins.
    ///
    /// # Errors
    ///
    /// Propagates storage errors; an empty result is `Ok(None)`.
    pub fn current_for_product<E: StoreExecutor>(
        executor: &E,
        product_id: i32,
    ) -> Result<Option<Promotion>, StoreError> {
        SelectQuery::new(Promotions::Table)
            .filter(Expr::col(Promotions::ProductId).eq(product_id))
            .filter(Expr::col(Promotions::Active).eq(true))
            .filter(Expr::col(Promotions::StartsAt).lte(Expr::cust("NOW()")))
            .filter(Expr::col(Promotions::EndsAt).gte(Expr::cust("NOW()")))
            .order_by(Promotions::StartsAt, sea_query::Order::Desc)
            .limit(1)
            .find_one(executor)
    }

    /// Count of promotions live right now, across the whole catalog.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn active_count<E: StoreExecutor>(executor: &E) -> Result<i64, StoreError> {
        query_value(
            executor,
            "SELECT COUNT(*) FROM flash_promotions \
             WHERE active = TRUE AND starts_at <= NOW() AND ends_at >= NOW()",
            &[],
        )
    }
}
