//! Per-column statistics for the profiler.

use crate::utils::series_as_f64;
use polars::prelude::*;

/// Minimum and maximum of the non-null values of a numeric column.
///
/// NaN values are ignored; an all-null column yields `(None, None)`.
pub(crate) fn numeric_range(series: &Series) -> PolarsResult<(Option<f64>, Option<f64>)> {
    let values = series_as_f64(series)?;
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;

    for value in values.into_iter().flatten().filter(|v| !v.is_nan()) {
        min = Some(min.map_or(value, |m| m.min(value)));
        max = Some(max.map_or(value, |m| m.max(value)));
    }

    Ok((min, max))
}

/// Number of values that are exactly the empty string.
pub(crate) fn empty_string_count(series: &Series) -> PolarsResult<usize> {
    Ok(series
        .str()?
        .into_iter()
        .filter(|v| matches!(v, Some("")))
        .count())
}

/// Number of distinct non-null values.
pub(crate) fn distinct_non_null(series: &Series) -> PolarsResult<usize> {
    series.drop_nulls().n_unique()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_range_basic() {
        let series = Series::new("Annual_Premium".into(), &[40454.0f64, 33536.0, 38294.0]);
        let (min, max) = numeric_range(&series).unwrap();
        assert_eq!(min, Some(33536.0));
        assert_eq!(max, Some(40454.0));
    }

    #[test]
    fn test_numeric_range_skips_nulls() {
        let series = Series::new("Age".into(), &[None, Some(21i64), Some(85), None]);
        assert_eq!(numeric_range(&series).unwrap(), (Some(21.0), Some(85.0)));
    }

    #[test]
    fn test_numeric_range_all_null() {
        let series = Series::new("Age".into(), &[None::<i64>, None]);
        assert_eq!(numeric_range(&series).unwrap(), (None, None));
    }

    #[test]
    fn test_empty_string_count() {
        let series = Series::new("Gender".into(), &[Some(""), Some("Male"), None, Some(""), Some(" ")]);
        assert_eq!(empty_string_count(&series).unwrap(), 2);
    }

    #[test]
    fn test_distinct_non_null_ignores_null() {
        let series = Series::new("Vehicle_Age".into(), &[Some("< 1 Year"), None, Some("< 1 Year"), Some("> 2 Years")]);
        assert_eq!(distinct_non_null(&series).unwrap(), 2);
    }
}
