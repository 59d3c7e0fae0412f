//! Shared utilities for the preprocessing core.
//!
//! Helpers used by the profiler, the encoder and the serving boundary.

use crate::types::IntWidth;
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for preprocessing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// String/text type
    String,
    /// Boolean, temporal and everything else
    Other,
}

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

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles thousands separators and currency symbols.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a string as an integer, accepting integral floats such as `"26.0"`.
pub fn parse_integer_string(s: &str) -> Option<i64> {
    let value = parse_numeric_string(s)?;
    if value.fract() != 0.0 || !IntWidth::I64.contains(value) {
        return None;
    }
    Some(value as i64)
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Render every value of a Series as a string, keeping nulls.
///
/// Categorical values are compared through this rendering, so a fitted
/// vocabulary and later inputs must share it. Floats use Rust's shortest
/// formatting, so an integral `26.0` renders as `26` exactly like an integer
/// column would.
pub fn series_as_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        return Ok(series_as_f64(series)?
            .into_iter()
            .map(|v| v.map(|v| v.to_string()))
            .collect());
    }
    let rendered = series.cast(&DataType::String)?;
    Ok(rendered
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Non-null values of a Series as `f64`.
pub fn series_as_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float = series.cast(&DataType::Float64)?;
    Ok(float.f64()?.into_iter().collect())
}

/// Value frequencies in first-seen order.
///
/// Returns `(value, count)` pairs ordered by first appearance. Callers decide
/// how nulls are rendered before counting.
pub fn value_frequencies<S: AsRef<str>>(values: &[S]) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for value in values {
        let value = value.as_ref();
        match positions.get(value) {
            Some(&idx) => order[idx].1 += 1,
            None => {
                positions.insert(value, order.len());
                order.push((value.to_string(), 1));
            }
        }
    }

    order
}

// =============================================================================
// Tests
// =============================================================================
