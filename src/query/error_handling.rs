//! Error detection and classification utilities.
//!
//! Two classifiers, both deliberately pattern-based because `may_postgres`
//! surfaces server errors as formatted messages: one distinguishes "no rows
//! found" (so `find_one` can return `None`), the other detects references to
//! columns or tables the database does not have (schema drift between
//! deployments), which the executor reports as
//! [`crate::StoreError::SchemaMismatch`] instead of retrying with an
//! alternate query.

use crate::executor::StoreError;

/// Check if an error represents a "no rows found" condition.
///
/// Matches only the specific "no rows" phrasings; broad "not found" messages
/// ("table not found", "column not found", ...) stay errors.
pub(crate) fn is_no_rows_error(error: &StoreError) -> bool {
    let message = match error {
        StoreError::PostgresError(pg_error) => pg_error.to_string(),
        StoreError::QueryError(msg) | StoreError::Other(msg) => msg.clone(),
        // Parse, schema, and stock errors are never "no rows found".
        StoreError::ParseError(_)
        | StoreError::SchemaMismatch(_)
        | StoreError::InsufficientStock { .. } => return false,
    };
    let message = message.to_lowercase();
    message.contains("no rows")
        || message.contains("no row")
        || message.contains("row not found")
        || message.contains("expected one row")
}

/// Check whether a server error message describes a missing column or table.
///
/// PostgreSQL phrases these as `column "x" does not exist` and
/// `relation "y" does not exist`.
pub(crate) fn looks_like_schema_mismatch(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("does not exist")
        && (message.contains("column") || message.contains("relation") || message.contains("table"))
}
