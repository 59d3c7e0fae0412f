//! Feature encoding: raw insurance records to a model-ready matrix.
//!
//! The work is split into a fit step that learns the categorical encoding
//! ([`EncodingScheme::fit`]) and a transform step that replays it
//! ([`EncodingScheme::transform`]). [`preprocess`] runs both on one frame,
//! which is how the training matrix is built.
//!
//! # Example
//!
//! ```rust,ignore
//! use xsell_processing::{get_config, preprocess};
//!
//! let config = get_config()?;
//! let matrix = preprocess(train_df, &config)?;
//! println!("{:?}", matrix.column_names());
//! ```

mod narrowing;
mod scheme;

pub use narrowing::{narrow_frame, narrow_series};
pub use scheme::{
    BinaryEncoding, CategoricalEncoding, EncodingScheme, NULL_CATEGORY, OneHotEncoding,
};

use crate::config::Configuration;
use crate::error::{PreprocessingError, Result};
use crate::utils::series_as_f64;
use polars::prelude::*;

/// Encoded, narrowed feature matrix.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    /// Identifier values, row-aligned with `features`. `None` when the input
    /// carried no identifier column.
    pub index: Option<Series>,
    /// Feature columns in model order, target last when present.
    pub features: DataFrame,
    /// Name of the trailing target column, when the input had one.
    pub target_column: Option<String>,
}

impl FeatureMatrix {
    pub fn height(&self) -> usize {
        self.features.height()
    }

    /// All column names including the target.
    pub fn column_names(&self) -> Vec<String> {
        self.features
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Feature columns only.
    pub fn feature_frame(&self) -> Result<DataFrame> {
        match &self.target_column {
            Some(target) => Ok(self.features.drop(target)?),
            None => Ok(self.features.clone()),
        }
    }

    /// One row of features as `f64`, target excluded.
    pub fn feature_row(&self, row: usize) -> Result<Vec<f64>> {
        if row >= self.height() {
            return Err(PreprocessingError::LengthMismatch {
                expected: row + 1,
                found: self.height(),
            });
        }

        let mut values = Vec::with_capacity(self.features.width());
        for column in self.features.get_columns() {
            if Some(column.name().as_str()) == self.target_column.as_deref() {
                continue;
            }
            let value = series_as_f64(column.as_materialized_series())?[row].ok_or_else(|| {
                PreprocessingError::TypeCoercion {
                    column: column.name().to_string(),
                    value: "null".to_string(),
                    target_type: "f64".to_string(),
                }
            })?;
            values.push(value);
        }
        Ok(values)
    }

    /// Frame with the identifier column prepended, for writing to disk.
    pub fn to_frame_with_index(&self) -> Result<DataFrame> {
        match &self.index {
            Some(index) => {
                let mut columns = vec![index.clone().into_column()];
                columns.extend(self.features.get_columns().iter().cloned());
                Ok(DataFrame::new(columns)?)
            }
            None => Ok(self.features.clone()),
        }
    }
}

/// Fit an encoding on `data` and apply it to the same frame.
///
/// The binary/one-hot partition and the vocabularies come from `data` itself.
/// Use [`EncodingScheme::fit`] and [`EncodingScheme::transform`] directly when
/// the encoding must be reused on other data.
pub fn preprocess(data: DataFrame, config: &Configuration) -> Result<FeatureMatrix> {
    let scheme = EncodingScheme::fit(&data, config)?;
    scheme.transform(&data)
}

/// Like [`preprocess`] but also returns the fitted scheme for persistence.
pub fn preprocess_with_scheme(
    data: DataFrame,
    config: &Configuration,
) -> Result<(FeatureMatrix, EncodingScheme)> {
    let scheme = EncodingScheme::fit(&data, config)?;
    let matrix = scheme.transform(&data)?;
    Ok((matrix, scheme))
}
