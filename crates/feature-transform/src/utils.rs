//! Shared utilities for the transformation step.
//!
//! Column extraction and the small statistics the transformers learn at fit
//! time live here so every transformer reads values the same way.

use crate::error::{Result, TransformationError};
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Fail with [`TransformationError::ColumnNotFound`] for the first missing column.
pub fn require_columns<'a, I>(df: &DataFrame, columns: I, dataset: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for col in columns {
        if df.column(col).is_err() {
            return Err(TransformationError::ColumnNotFound {
                column: col.clone(),
                dataset: dataset.to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Read a column as a Float64 chunked array. NaN is treated as missing.
///
/// Uses a strict cast, so a string column holding non-numeric text fails
/// instead of silently turning into nulls.
pub fn numeric_chunked(df: &DataFrame, col_name: &str) -> Result<Float64Chunked> {
    let series = df.column(col_name)?.as_materialized_series();
    let floats = series
        .strict_cast(&DataType::Float64)
        .map_err(|e| TransformationError::TypeConversionFailed {
            column: col_name.to_string(),
            target_type: "Float64".to_string(),
            reason: e.to_string(),
        })?;

    let ca: Float64Chunked = floats
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(ca.with_name(col_name.into()))
}

/// Read a column as optional f64 values. NaN is treated as missing.
pub fn numeric_values(df: &DataFrame, col_name: &str) -> Result<Vec<Option<f64>>> {
    Ok(numeric_chunked(df, col_name)?.into_iter().collect())
}

/// Read a column as optional string values.
pub fn string_values(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(col_name)?.as_materialized_series();
    let strings = series.cast(&DataType::String)?;

    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Statistics
// =============================================================================

/// Most frequent value. Ties resolve to the lexicographically smallest value
/// so repeated fits on the same data always agree.
pub fn string_mode<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in values {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_chunked_treats_nan_as_missing() {
        let df = df![
            "score" => [Some(1.0f64), Some(f64::NAN), None, Some(3.0)],
        ]
        .unwrap();

        let ca = numeric_chunked(&df, "score").unwrap();
        assert_eq!(ca.null_count(), 2);
        assert_eq!(ca.mean(), Some(2.0));
        assert_eq!(ca.name().as_str(), "score");
    }

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_string_mode() {
        assert_eq!(
            string_mode(["a", "b", "a", "c", "a"]),
            Some("a".to_string())
        );
        // tie between "b" and "a" resolves to "a"
        assert_eq!(string_mode(["b", "a", "b", "a"]), Some("a".to_string()));
        assert_eq!(string_mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_numeric_values_treats_nulls_as_missing() {
        let df = df![
            "score" => [Some(1i64), None, Some(3)],
        ]
        .unwrap();

        let values = numeric_values(&df, "score").unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_numeric_values_rejects_text() {
        let df = df![
            "score" => ["72", "abc"],
        ]
        .unwrap();

        let err = numeric_values(&df, "score").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }

    #[test]
    fn test_require_columns() {
        let df = df!["a" => [1, 2]].unwrap();
        let present = vec!["a".to_string()];
        let missing = vec!["a".to_string(), "b".to_string()];

        assert!(require_columns(&df, &present, "train").is_ok());
        let err = require_columns(&df, &missing, "train").unwrap_err();
        assert!(err.to_string().contains("'b'"));
        assert!(err.to_string().contains("train"));
    }
}
