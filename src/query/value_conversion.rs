//! Value conversion from sea-query to `may_postgres`.
//!
//! Converts the `Values` produced by `SelectStatement::build` into the
//! `&[&dyn ToSql]` slice the driver expects, in two passes: the first pass
//! collects owned values into typed vectors, the second pass hands out
//! references into those vectors. The references stay valid for the duration
//! of the closure, which performs the actual database call.

use crate::executor::StoreError;
use chrono::{DateTime, Utc};
use may_postgres::types::ToSql;
use rust_decimal::Decimal;
use sea_query::Value;

/// Convert sea-query values to `ToSql` parameters and run `f` with them.
///
/// # Errors
///
/// Returns `StoreError::Other` if a value type with no driver mapping is
/// encountered, or whatever error `f` itself produces.
pub(crate) fn with_converted_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, StoreError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StoreError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut bytes: Vec<Vec<u8>> = Vec::new();
    let mut nulls: Vec<Option<i32>> = Vec::new();
    let mut floats: Vec<f32> = Vec::new();
    let mut doubles: Vec<f64> = Vec::new();
    let mut decimals: Vec<Decimal> = Vec::new();
    let mut timestamps: Vec<DateTime<Utc>> = Vec::new();

    // First pass: collect all values into typed vectors.
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Bytes(Some(b)) => bytes.push(b.clone()),
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None)
            | Value::Bytes(None) => nulls.push(None),
            Value::TinyInt(Some(i)) => ints.push(*i as i32),
            Value::SmallInt(Some(i)) => ints.push(*i as i32),
            Value::TinyUnsigned(Some(u)) => ints.push(*u as i32),
            Value::SmallUnsigned(Some(u)) => ints.push(*u as i32),
            Value::Unsigned(Some(u)) => big_ints.push(*u as i64),
            Value::BigUnsigned(Some(u)) => {
                if *u > i64::MAX as u64 {
                    return Err(StoreError::Other(format!(
                        "BigUnsigned value {} exceeds i64::MAX ({}), cannot be safely cast to i64",
                        u,
                        i64::MAX
                    )));
                }
                big_ints.push(*u as i64);
            }
            Value::Float(Some(v)) => floats.push(*v),
            Value::Double(Some(d)) => doubles.push(*d),
            Value::Decimal(Some(d)) => decimals.push(**d),
            Value::ChronoDateTimeUtc(Some(dt)) => timestamps.push(**dt),
            Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::Decimal(None)
            | Value::ChronoDateTimeUtc(None) => nulls.push(None),
            Value::Json(Some(j)) => {
                strings.push(
                    serde_json::to_string(&**j)
                        .map_err(|e| StoreError::Other(format!("Failed to serialize JSON: {e}")))?,
                );
            }
            Value::Json(None) => nulls.push(None),
            _ => {
                return Err(StoreError::Other(format!(
                    "Unsupported value type in query: {value:?}"
                )));
            }
        }
    }

    // Second pass: hand out references in the original value order.
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut byte_idx = 0;
    let mut null_idx = 0;
    let mut float_idx = 0;
    let mut double_idx = 0;
    let mut decimal_idx = 0;
    let mut timestamp_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();

    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::Int(Some(_))
            | Value::TinyInt(Some(_))
            | Value::SmallInt(Some(_))
            | Value::TinyUnsigned(Some(_))
            | Value::SmallUnsigned(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) | Value::BigUnsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::String(Some(_)) | Value::Json(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            Value::Bytes(Some(_)) => {
                params.push(&bytes[byte_idx] as &dyn ToSql);
                byte_idx += 1;
            }
            Value::Float(Some(_)) => {
                params.push(&floats[float_idx] as &dyn ToSql);
                float_idx += 1;
            }
            Value::Double(Some(_)) => {
                params.push(&doubles[double_idx] as &dyn ToSql);
                double_idx += 1;
            }
            Value::Decimal(Some(_)) => {
                params.push(&decimals[decimal_idx] as &dyn ToSql);
                decimal_idx += 1;
            }
            Value::ChronoDateTimeUtc(Some(_)) => {
                params.push(&timestamps[timestamp_idx] as &dyn ToSql);
                timestamp_idx += 1;
            }
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::String(None)
            | Value::Bytes(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::Decimal(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::Json(None) => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
            _ => {
                return Err(StoreError::Other(format!(
                    "Unsupported value type in query: {value:?}"
                )));
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::Values;

    #[test]
    fn test_parameter_count_preserved() {
        let values = Values(vec![
            Value::Int(Some(42)),
            Value::String(Some("nike".to_string())),
            Value::Bool(Some(true)),
            Value::Double(Some(4.5)),
        ]);

        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_decimal_and_timestamp_values() {
        let values = Values(vec![
            Value::Decimal(Some(Box::new(Decimal::new(19999, 2)))),
            Value::ChronoDateTimeUtc(Some(Box::new(Utc::now()))),
        ]);

        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_null_values_bind_as_null() {
        let values = Values(vec![Value::String(None), Value::Decimal(None)]);

        let count = with_converted_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_big_unsigned_overflow_rejected() {
        let values = Values(vec![Value::BigUnsigned(Some(u64::MAX))]);

        let result = with_converted_params(&values, |params| Ok(params.len()));
        assert!(result.is_err());
    }
}
