//! Catalog filter and its translation to a SELECT statement.
//!
//! [`ProductFilter`] is the value object route handlers build from query
//! parameters. Every field is optional; an empty filter means "all products,
//! default order". Each present field contributes exactly one AND clause, and
//! all user-supplied values travel as bound parameters.

use crate::catalog::product::{Product, Products};
use crate::catalog::promotion;
use crate::query::SelectQuery;
use rust_decimal::Decimal;
use sea_query::{Expr, ExprTrait, Order};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Product condition tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    /// The value stored in the `condition` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
        }
    }

    /// Parse a request-supplied tag, case-insensitively. Unrecognized tags
    /// yield `None` so the caller can skip the clause instead of matching
    /// nothing.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "new" => Some(Condition::New),
            "used" => Some(Condition::Used),
            _ => None,
        }
    }
}

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    RatingDesc,
    Newest,
}

impl SortKey {
    /// Parse a request-supplied sort key. Unrecognized keys yield `None`,
    /// which [`ProductFilter::to_query`] treats as the default order
    /// (identifier ascending).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "price_asc" => Some(SortKey::PriceAsc),
            "price_desc" => Some(SortKey::PriceDesc),
            "name_asc" => Some(SortKey::NameAsc),
            "name_desc" => Some(SortKey::NameDesc),
            "rating" => Some(SortKey::RatingDesc),
            "newest" => Some(SortKey::Newest),
            _ => None,
        }
    }
}

/// Optional constraints over the product catalog.
///
/// Fields are independent AND clauses; within a set field (brands,
/// categories, genders) membership is OR'd via IN. The builder performs no
/// cross-field validation: an inverted price range is legal and simply
/// matches zero rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    /// Substring match against name OR brand, case-insensitive. Empty or
    /// whitespace-only terms add no clause.
    pub search_term: Option<String>,
    pub brands: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub condition: Option<Condition>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub in_stock_only: bool,
    /// Only products with a currently-active flash promotion.
    pub featured_only: bool,
    pub sort: Option<SortKey>,
    /// Coerced to at least 1 when present. Absent means unbounded.
    pub limit: Option<i64>,
    /// Applies only when `limit` is present. Negative values clamp to 0.
    pub offset: Option<i64>,
}

impl ProductFilter {
    /// Build the listing query: predicates, ORDER BY, and pagination.
    pub fn to_query(&self) -> SelectQuery<Product> {
        let mut query = self.apply_predicates(SelectQuery::new(Products::Table));

        let (column, order) = match self.sort {
            Some(SortKey::PriceAsc) => (Products::Price, Order::Asc),
            Some(SortKey::PriceDesc) => (Products::Price, Order::Desc),
            Some(SortKey::NameAsc) => (Products::Name, Order::Asc),
            Some(SortKey::NameDesc) => (Products::Name, Order::Desc),
            Some(SortKey::RatingDesc) => (Products::Rating, Order::Desc),
            Some(SortKey::Newest) => (Products::CreatedAt, Order::Desc),
            None => (Products::Id, Order::Asc),
        };
        query = query.order_by(column, order);

        if let Some(limit) = self.limit {
            query = query.limit(limit.max(1) as u64);
            if let Some(offset) = self.offset {
                query = query.offset(offset.max(0) as u64);
            }
        }

        query
    }

    /// Build the matching-row count query: same predicates, no ORDER BY and
    /// no pagination, so the total is independent of the requested page.
    pub fn to_count_query(&self) -> SelectQuery<Product> {
        self.apply_predicates(SelectQuery::new(Products::Table))
    }

    fn apply_predicates(&self, mut query: SelectQuery<Product>) -> SelectQuery<Product> {
        if let Some(term) = self.search_term.as_deref() {
            let term = term.trim();
            if !term.is_empty() {
                let pattern = format!("%{term}%");
                query = query.filter(
                    Expr::col(Products::Name)
                        .ilike(pattern.clone())
                        .or(Expr::col(Products::Brand).ilike(pattern)),
                );
            }
        }

        if !self.brands.is_empty() {
            query = query.filter(Expr::col(Products::Brand).is_in(self.brands.iter().cloned()));
        }
        if !self.categories.is_empty() {
            query =
                query.filter(Expr::col(Products::Category).is_in(self.categories.iter().cloned()));
        }
        if !self.genders.is_empty() {
            query = query.filter(Expr::col(Products::Gender).is_in(self.genders.iter().cloned()));
        }

        if let Some(condition) = self.condition {
            query = query.filter(Expr::col(Products::Condition).eq(condition.as_str()));
        }

        if let Some(min) = self.min_price {
            query = query.filter(Expr::col(Products::Price).gte(min));
        }
        if let Some(max) = self.max_price {
            query = query.filter(Expr::col(Products::Price).lte(max));
        }

        if let Some(min_rating) = self.min_rating {
            query = query.filter(Expr::col(Products::Rating).gte(min_rating));
        }

        if self.in_stock_only {
            query = query.filter(Expr::col(Products::StockQuantity).gt(0));
        }

        if self.featured_only {
            query = query.filter(promotion::active_window());
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{PostgresQueryBuilder, Value};

    fn build(filter: &ProductFilter) -> (String, sea_query::Values) {
        filter.to_query().query.build(PostgresQueryBuilder)
    }

    #[test]
    fn test_empty_filter_defaults() {
        let (sql, values) = build(&ProductFilter::default());
        assert!(!sql.contains("WHERE"), "empty filter added a predicate: {sql}");
        assert!(sql.contains("ORDER BY \"id\" ASC"), "default order missing: {sql}");
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
        assert_eq!(values.iter().count(), 0);
    }

    #[test]
    fn test_search_term_matches_name_or_brand() {
        let filter = ProductFilter {
            search_term: Some("Air".to_string()),
            ..Default::default()
        };
        let (sql, values) = build(&filter);
        assert!(sql.contains("ILIKE"), "search must be case-insensitive: {sql}");
        assert!(sql.contains("OR"), "name and brand are alternatives: {sql}");
        let bound: Vec<_> = values.iter().collect();
        assert_eq!(bound.len(), 2);
        for value in bound {
            assert_eq!(*value, Value::from("%Air%"));
        }
    }

    #[test]
    fn test_blank_search_term_adds_no_clause() {
        let filter = ProductFilter {
            search_term: Some("   ".to_string()),
            ..Default::default()
        };
        let (sql, _) = build(&filter);
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn test_set_fields_use_in() {
        let filter = ProductFilter {
            brands: ["Nike".to_string(), "Adidas".to_string()].into(),
            categories: ["running".to_string()].into(),
            ..Default::default()
        };
        let (sql, values) = build(&filter);
        assert!(sql.contains("\"brand\" IN"));
        assert!(sql.contains("\"category\" IN"));
        assert_eq!(values.iter().count(), 3);
    }

    #[test]
    fn test_price_bounds_are_independent() {
        let only_min = ProductFilter {
            min_price: Some(Decimal::new(10000, 2)),
            ..Default::default()
        };
        let (sql, values) = build(&only_min);
        assert!(sql.contains("\"price\" >="));
        assert!(!sql.contains("\"price\" <="));
        assert_eq!(values.iter().count(), 1);

        // Inverted range builds both clauses without complaint.
        let inverted = ProductFilter {
            min_price: Some(Decimal::new(10000, 2)),
            max_price: Some(Decimal::new(5000, 2)),
            ..Default::default()
        };
        let (sql, values) = build(&inverted);
        assert!(sql.contains("\"price\" >="));
        assert!(sql.contains("\"price\" <="));
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn test_in_stock_only() {
        let filter = ProductFilter {
            in_stock_only: true,
            ..Default::default()
        };
        let (sql, _) = build(&filter);
        assert!(sql.contains("\"stock_quantity\" >"));
    }

    #[test]
    fn test_featured_uses_exists_not_join() {
        let filter = ProductFilter {
            featured_only: true,
            ..Default::default()
        };
        let (sql, _) = build(&filter);
        assert!(sql.contains("EXISTS"), "featured must be an existence check: {sql}");
        assert!(!sql.contains("JOIN"), "featured must not join and duplicate rows: {sql}");
        assert!(sql.contains("flash_promotions"));
    }

    #[test]
    fn test_sort_keys() {
        let cases = [
            (SortKey::PriceAsc, "ORDER BY \"price\" ASC"),
            (SortKey::PriceDesc, "ORDER BY \"price\" DESC"),
            (SortKey::NameAsc, "ORDER BY \"name\" ASC"),
            (SortKey::NameDesc, "ORDER BY \"name\" DESC"),
            (SortKey::RatingDesc, "ORDER BY \"rating\" DESC"),
            (SortKey::Newest, "ORDER BY \"created_at\" DESC"),
        ];
        for (key, expected) in cases {
            let filter = ProductFilter {
                sort: Some(key),
                ..Default::default()
            };
            let (sql, _) = build(&filter);
            assert!(sql.contains(expected), "{key:?}: {sql}");
        }
    }

    #[test]
    fn test_unrecognized_sort_key_parses_to_none() {
        assert_eq!(SortKey::parse("cheapest"), None);
        assert_eq!(SortKey::parse(""), None);
        assert_eq!(SortKey::parse(" price_asc "), Some(SortKey::PriceAsc));
    }

    #[test]
    fn test_limit_coerced_positive() {
        let filter = ProductFilter {
            limit: Some(0),
            ..Default::default()
        };
        let (sql, values) = build(&filter);
        assert!(sql.contains("LIMIT"));
        assert!(
            values.iter().any(|v| *v == Value::BigUnsigned(Some(1))),
            "limit 0 must coerce to 1"
        );
    }

    #[test]
    fn test_offset_requires_limit() {
        let filter = ProductFilter {
            offset: Some(10),
            ..Default::default()
        };
        let (sql, _) = build(&filter);
        assert!(!sql.contains("OFFSET"), "offset without limit must be ignored: {sql}");

        let filter = ProductFilter {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        };
        let (sql, _) = build(&filter);
        assert!(sql.contains("LIMIT"));
        assert!(sql.contains("OFFSET"));
    }

    #[test]
    fn test_count_query_ignores_sort_and_pagination() {
        let filter = ProductFilter {
            search_term: Some("Air".to_string()),
            sort: Some(SortKey::PriceDesc),
            limit: Some(5),
            offset: Some(10),
            ..Default::default()
        };
        let (sql, values) = filter.to_count_query().query.build(PostgresQueryBuilder);
        assert!(sql.contains("ILIKE"), "count keeps the predicates: {sql}");
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
        assert_eq!(values.iter().count(), 2);
    }

    #[test]
    fn test_deserializes_sparse_input() {
        // No field is required: an empty document is the default filter.
        let filter: ProductFilter = serde_json::from_str("{}").unwrap();
        let (sql, _) = build(&filter);
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY \"id\" ASC"));

        let filter: ProductFilter =
            serde_json::from_str(r#"{"search_term":"Air","limit":5}"#).unwrap();
        assert_eq!(filter.search_term.as_deref(), Some("Air"));
        assert_eq!(filter.limit, Some(5));
        assert!(filter.brands.is_empty());
        assert!(!filter.in_stock_only);
        assert!(!filter.featured_only);
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(Condition::parse("NEW"), Some(Condition::New));
        assert_eq!(Condition::parse(" used "), Some(Condition::Used));
        assert_eq!(Condition::parse("refurbished"), None);
    }
}
