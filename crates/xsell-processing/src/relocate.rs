//! Target column relocation.
//!
//! The trained model expects its response column in the final position of
//! the feature frame. [`move_target_to_last`] guarantees that without
//! disturbing the relative order of any other column.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

/// Tabular input accepted by the relocator: a whole frame or a lone column.
#[derive(Debug, Clone)]
pub enum Data {
    Frame(DataFrame),
    Column(Column),
}

impl Data {
    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            Data::Frame(df) => df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
            Data::Column(column) => vec![column.name().to_string()],
        }
    }

    /// Unwrap the frame variant.
    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            Data::Frame(df) => Some(df),
            Data::Column(_) => None,
        }
    }
}

impl From<DataFrame> for Data {
    fn from(df: DataFrame) -> Self {
        Data::Frame(df)
    }
}

impl From<Column> for Data {
    fn from(column: Column) -> Self {
        Data::Column(column)
    }
}

/// Return `data` with `target` as its last column.
///
/// - a lone column must already be the target, else [`PreprocessingError::SchemaMismatch`];
/// - a frame without `target` fails with [`PreprocessingError::ColumnNotFound`];
/// - a frame whose last column is `target` is returned as-is.
pub fn move_target_to_last(data: Data, target: &str) -> Result<Data> {
    match data {
        Data::Column(column) => {
            if column.name().as_str() != target {
                return Err(PreprocessingError::SchemaMismatch {
                    expected: format!("column '{}'", target),
                    found: format!("column '{}'", column.name()),
                });
            }
            Ok(Data::Column(column))
        }
        Data::Frame(df) => move_target_to_last_frame(df, target).map(Data::Frame),
    }
}

/// Frame-only variant of [`move_target_to_last`].
pub fn move_target_to_last_frame(df: DataFrame, target: &str) -> Result<DataFrame> {
    let names: Vec<PlSmallStr> = df.get_column_names().into_iter().cloned().collect();

    if !names.iter().any(|name| name.as_str() == target) {
        return Err(PreprocessingError::ColumnNotFound(target.to_string()));
    }
    if names.last().map(|name| name.as_str()) == Some(target) {
        return Ok(df);
    }

    let reordered: Vec<PlSmallStr> = names
        .iter()
        .filter(|name| name.as_str() != target)
        .cloned()
        .chain(std::iter::once(PlSmallStr::from(target)))
        .collect();

    Ok(df.select(reordered)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> DataFrame {
        df!(
            "Age" => &[44i64, 76, 47],
            "Response" => &[1i64, 0, 1],
            "Vintage" => &[217i64, 183, 27],
            "Gender" => &["Male", "Male", "Female"],
        )
        .unwrap()
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_moves_target_and_keeps_relative_order() {
        let moved = move_target_to_last_frame(sample(), "Response").unwrap();
        assert_eq!(names(&moved), vec!["Age", "Vintage", "Gender", "Response"]);
        assert_eq!(moved.height(), 3);
        let response: Vec<Option<i64>> = moved
            .column("Response")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(response, vec![Some(1), Some(0), Some(1)]);
    }

    #[test]
    fn test_already_last_is_identity() {
        let once = move_target_to_last_frame(sample(), "Response").unwrap();
        let twice = move_target_to_last_frame(once.clone(), "Response").unwrap();
        assert!(once.equals(&twice));
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn test_missing_target_in_frame() {
        let err = move_target_to_last(Data::from(sample()), "Churn").unwrap_err();
        assert!(matches!(err, PreprocessingError::ColumnNotFound(ref c) if c == "Churn"));
    }

    #[test]
    fn test_single_column_with_other_name() {
        let column = Column::new("Age".into(), &[1i64, 2]);
        let err = move_target_to_last(Data::from(column), "Response").unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_single_target_column_passes_through() {
        let column = Column::new("Response".into(), &[1i64, 0]);
        let out = move_target_to_last(Data::from(column), "Response").unwrap();
        assert_eq!(out.column_names(), vec!["Response"]);
        assert!(out.into_frame().is_none());
    }
}
