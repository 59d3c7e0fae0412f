//! Column profiling for data-quality inspection.
//!
//! The profiler is purely observational: it reads a frame and reports, per
//! column, its dtype, null count and distinct count, plus the value range of
//! numeric columns or the empty-string count of string columns. Nothing on
//! the prediction path depends on it.

mod statistics;

use crate::error::Result;
use crate::types::{ProfileDetail, ProfileRow, ProfileTable};
use crate::utils::{DtypeCategory, get_dtype_category};
use polars::prelude::*;
use tracing::debug;

pub(crate) use statistics::{distinct_non_null, empty_string_count, numeric_range};

/// Profile every column of `df`.
pub fn initial_check(df: &DataFrame) -> Result<ProfileTable> {
    ColumnProfiler::profile(df)
}

/// Column profiler.
pub struct ColumnProfiler;

impl ColumnProfiler {
    /// Profile an entire dataset, one row per column in input order.
    pub fn profile(df: &DataFrame) -> Result<ProfileTable> {
        let mut rows = Vec::with_capacity(df.width());
        for col_name in df.get_column_names() {
            rows.push(Self::profile_column(df, col_name)?);
        }

        debug!(
            "Profiled {} columns over {} rows",
            rows.len(),
            df.height()
        );
        Ok(ProfileTable { rows })
    }

    fn profile_column(df: &DataFrame, col_name: &str) -> Result<ProfileRow> {
        let series = df.column(col_name)?.as_materialized_series();

        let detail = match get_dtype_category(series.dtype()) {
            DtypeCategory::Numeric => {
                let (min, max) = numeric_range(series)?;
                ProfileDetail::Numeric { min, max }
            }
            DtypeCategory::String => ProfileDetail::Text {
                empty_count: empty_string_count(series)?,
            },
            DtypeCategory::Other => ProfileDetail::Other,
        };

        Ok(ProfileRow {
            column: col_name.to_string(),
            dtype: format!("{:?}", series.dtype()),
            null_count: series.null_count(),
            unique_count: distinct_non_null(series)?,
            detail,
        })
    }
}

impl ProfileTable {
    /// Render the table as a frame with the columns
    /// `Column, Type, Null Count, Unique Count, Min, Max, Empty String Count`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut names = Vec::with_capacity(self.len());
        let mut dtypes = Vec::with_capacity(self.len());
        let mut nulls = Vec::with_capacity(self.len());
        let mut uniques = Vec::with_capacity(self.len());
        let mut mins = Vec::with_capacity(self.len());
        let mut maxs = Vec::with_capacity(self.len());
        let mut empties = Vec::with_capacity(self.len());

        for row in &self.rows {
            names.push(row.column.clone());
            dtypes.push(row.dtype.clone());
            nulls.push(row.null_count as u64);
            uniques.push(row.unique_count as u64);
            match row.detail {
                ProfileDetail::Numeric { min, max } => {
                    mins.push(min);
                    maxs.push(max);
                    empties.push(None);
                }
                ProfileDetail::Text { empty_count } => {
                    mins.push(None);
                    maxs.push(None);
                    empties.push(Some(empty_count as u64));
                }
                ProfileDetail::Other => {
                    mins.push(None);
                    maxs.push(None);
                    empties.push(None);
                }
            }
        }

        let df = DataFrame::new(vec![
            Column::new("Column".into(), names),
            Column::new("Type".into(), dtypes),
            Column::new("Null Count".into(), nulls),
            Column::new("Unique Count".into(), uniques),
            Column::new("Min".into(), mins),
            Column::new("Max".into(), maxs),
            Column::new("Empty String Count".into(), empties),
        ])?;
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df!(
            "id" => &[1i64, 2, 3, 4],
            "Gender" => &[Some("Male"), Some(""), None, Some("Female")],
            "Annual_Premium" => &[Some(40454.0f64), Some(2630.0), None, Some(540165.0)],
            "Driving_License" => &[true, true, false, true],
        )
        .unwrap()
    }

    #[test]
    fn test_one_row_per_column_in_order() {
        let table = initial_check(&sample()).unwrap();
        let columns: Vec<&str> = table.rows.iter().map(|r| r.column.as_str()).collect();
        assert_eq!(columns, vec!["id", "Gender", "Annual_Premium", "Driving_License"]);
    }

    #[test]
    fn test_numeric_profile() {
        let table = initial_check(&sample()).unwrap();
        let premium = table.get("Annual_Premium").unwrap();
        assert_eq!(premium.null_count, 1);
        assert_eq!(premium.unique_count, 3);
        assert_eq!(
            premium.detail,
            ProfileDetail::Numeric {
                min: Some(2630.0),
                max: Some(540165.0)
            }
        );
        assert_eq!(premium.dtype, "Float64");
    }

    #[test]
    fn test_string_profile() {
        let table = initial_check(&sample()).unwrap();
        let gender = table.get("Gender").unwrap();
        assert_eq!(gender.null_count, 1);
        assert_eq!(gender.unique_count, 3);
        assert_eq!(gender.detail, ProfileDetail::Text { empty_count: 1 });
    }

    #[test]
    fn test_other_dtype_has_no_detail() {
        let table = initial_check(&sample()).unwrap();
        let license = table.get("Driving_License").unwrap();
        assert_eq!(license.detail, ProfileDetail::Other);
        assert_eq!(license.unique_count, 2);
    }

    #[test]
    fn test_profile_does_not_modify_input() {
        let df = sample();
        let before = df.clone();
        let _ = initial_check(&df).unwrap();
        assert!(df.equals_missing(&before));
    }

    #[test]
    fn test_to_dataframe_shape() {
        let frame = initial_check(&sample()).unwrap().to_dataframe().unwrap();
        assert_eq!(frame.shape(), (4, 7));
        let empties = frame.column("Empty String Count").unwrap();
        assert_eq!(empties.null_count(), 3);
    }
}
