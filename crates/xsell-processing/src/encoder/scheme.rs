//! Fitted categorical encoding.
//!
//! [`EncodingScheme::fit`] learns, from a training frame, which categorical
//! columns are binary and which are one-hot, the 0/1 mapping of each binary
//! column and the vocabulary of each one-hot column. [`EncodingScheme::transform`]
//! replays exactly that encoding on any later frame, including a single
//! serving record, so the feature layout never drifts from what the model was
//! trained on.
//!
//! Output layout: non-categorical columns in fitting order, then one encoded
//! block per categorical column in configuration order, then the target.

use crate::config::{Configuration, TARGET_WIDTH};
use crate::encoder::FeatureMatrix;
use crate::encoder::narrowing::{narrow_frame, narrow_series};
use crate::error::{PreprocessingError, Result, ResultExt};
use crate::relocate::move_target_to_last_frame;
use crate::types::IntWidth;
use crate::utils::{is_numeric_dtype, parse_numeric_string, series_as_strings, value_frequencies};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Category label standing in for a missing value.
///
/// Nulls are an ordinary category: they count towards the binary/one-hot
/// decision at fit time and are encoded like any other value afterwards.
pub const NULL_CATEGORY: &str = "null";

/// 0/1 recoding of a two-valued categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryEncoding {
    pub column: String,
    /// Most frequent value in the fitting data, encoded as 1.
    pub positive: String,
    /// The other value, encoded as 0.
    pub negative: String,
}

impl BinaryEncoding {
    fn encode(&self, value: &str) -> Result<i8> {
        if value == self.positive {
            Ok(1)
        } else if value == self.negative {
            Ok(0)
        } else {
            Err(PreprocessingError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
        }
    }
}

/// Indicator expansion of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncoding {
    pub column: String,
    /// Observed categories in indicator order. No reference level is dropped.
    pub categories: Vec<String>,
}

impl OneHotEncoding {
    /// Indicator column names, `{column}_{category}`.
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| format!("{}_{}", self.column, category))
            .collect()
    }

    fn position(&self, value: &str) -> Result<usize> {
        self.categories
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| PreprocessingError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
    }
}

/// Fitted encoding of one categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoricalEncoding {
    Binary(BinaryEncoding),
    OneHot(OneHotEncoding),
}

impl CategoricalEncoding {
    /// Raw column this encoding reads.
    pub fn column(&self) -> &str {
        match self {
            CategoricalEncoding::Binary(b) => &b.column,
            CategoricalEncoding::OneHot(o) => &o.column,
        }
    }

    /// Output column names of the encoded block.
    pub fn feature_names(&self) -> Vec<String> {
        match self {
            CategoricalEncoding::Binary(b) => vec![b.column.clone()],
            CategoricalEncoding::OneHot(o) => o.feature_names(),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            CategoricalEncoding::Binary(_) => 1,
            CategoricalEncoding::OneHot(o) => o.categories.len(),
        }
    }

    fn encode(&self, series: &Series) -> Result<Vec<Column>> {
        match self {
            CategoricalEncoding::Binary(b) => Ok(vec![encode_binary(b, series)?]),
            CategoricalEncoding::OneHot(o) => encode_one_hot(o, series),
        }
    }
}

/// A fitted, persistable encoding of the raw schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingScheme {
    pub id_column: String,
    pub target_column: String,
    /// Non-categorical feature columns in fitting input order.
    pub base_columns: Vec<String>,
    /// One entry per configured categorical column, in configuration order.
    pub categorical: Vec<CategoricalEncoding>,
    /// Storage widths for columns present in the output.
    pub narrowing: BTreeMap<String, IntWidth>,
}

impl EncodingScheme {
    /// Learn the encoding from `df`.
    ///
    /// Categorical columns with exactly two distinct observed values (null
    /// counting as a value) become binary: most frequent value → 1, first-seen
    /// wins a tie. Every other categorical column is one-hot encoded over its
    /// observed values.
    pub fn fit(df: &DataFrame, config: &Configuration) -> Result<Self> {
        require_column(df, &config.id_column)?;
        for col in &config.categorical_cols {
            require_column(df, col)?;
        }

        let mut categorical = Vec::with_capacity(config.categorical_cols.len());

        for col in &config.categorical_cols {
            let series = df.column(col)?.as_materialized_series();
            let freqs = value_frequencies(&category_values(series)?);

            if freqs.len() == 2 {
                // strict comparison keeps the first-seen value on a tie
                let (first, second) = (&freqs[0], &freqs[1]);
                let (positive, negative) = if second.1 > first.1 {
                    (second.0.clone(), first.0.clone())
                } else {
                    (first.0.clone(), second.0.clone())
                };
                debug!(
                    "'{}' is binary: '{}' -> 1, '{}' -> 0",
                    col, positive, negative
                );
                categorical.push(CategoricalEncoding::Binary(BinaryEncoding {
                    column: col.clone(),
                    positive,
                    negative,
                }));
            } else {
                let categories = sorted_categories(
                    freqs.into_iter().map(|(value, _)| value).collect(),
                    is_numeric_dtype(series.dtype()),
                );
                debug!("'{}' is one-hot over {} categories", col, categories.len());
                categorical.push(CategoricalEncoding::OneHot(OneHotEncoding {
                    column: col.clone(),
                    categories,
                }));
            }
        }

        if !categorical
            .iter()
            .any(|e| matches!(e, CategoricalEncoding::OneHot(_)))
        {
            debug!("No non-binary categorical columns; skipping one-hot encoding");
        }

        let base_columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| {
                *name != config.id_column
                    && *name != config.target_col
                    && !config.is_categorical(name)
            })
            .map(str::to_string)
            .collect();

        let plan = config.narrowing_plan();
        let mut narrowing: BTreeMap<String, IntWidth> = base_columns
            .iter()
            .filter_map(|name| plan.get(name).map(|width| (name.clone(), *width)))
            .collect();
        narrowing.insert(config.target_col.clone(), TARGET_WIDTH);

        let scheme = EncodingScheme {
            id_column: config.id_column.clone(),
            target_column: config.target_col.clone(),
            base_columns,
            categorical,
            narrowing,
        };

        info!(
            "Fitted encoding scheme: {} binary, {} one-hot, {} features",
            scheme.binary().count(),
            scheme.one_hot().count(),
            scheme.feature_count()
        );
        Ok(scheme)
    }

    /// Binary encodings in configuration order.
    pub fn binary(&self) -> impl Iterator<Item = &BinaryEncoding> {
        self.categorical.iter().filter_map(|e| match e {
            CategoricalEncoding::Binary(b) => Some(b),
            CategoricalEncoding::OneHot(_) => None,
        })
    }

    /// One-hot encodings in configuration order.
    pub fn one_hot(&self) -> impl Iterator<Item = &OneHotEncoding> {
        self.categorical.iter().filter_map(|e| match e {
            CategoricalEncoding::OneHot(o) => Some(o),
            CategoricalEncoding::Binary(_) => None,
        })
    }

    /// Raw columns a frame must carry to be transformed (id and target aside).
    pub fn source_columns(&self) -> impl Iterator<Item = &str> {
        self.base_columns
            .iter()
            .map(String::as_str)
            .chain(self.categorical.iter().map(CategoricalEncoding::column))
    }

    /// Feature column names in model order, target excluded.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.base_columns.clone();
        for encoding in &self.categorical {
            names.extend(encoding.feature_names());
        }
        names
    }

    /// Width of the feature vector.
    pub fn feature_count(&self) -> usize {
        self.base_columns.len() + self.categorical.iter().map(|e| e.width()).sum::<usize>()
    }

    /// Apply the fitted encoding to `df`.
    ///
    /// The identifier column becomes the matrix index when present. The
    /// target column is moved last when present. Input columns the scheme
    /// does not know are dropped.
    pub fn transform(&self, df: &DataFrame) -> Result<FeatureMatrix> {
        let index = df
            .column(&self.id_column)
            .ok()
            .map(|c| c.as_materialized_series().clone());

        let mut columns: Vec<Column> = Vec::with_capacity(self.feature_count() + 1);

        for name in &self.base_columns {
            let series = df
                .column(name)
                .map_err(|_| PreprocessingError::ColumnNotFound(name.clone()))?
                .as_materialized_series();
            columns.push(series.clone().into_column());
        }

        let target_column = match df.column(&self.target_column) {
            Ok(target) => {
                let narrowed = narrow_series(target.as_materialized_series(), TARGET_WIDTH)
                    .context("Narrowing target column")?;
                columns.push(narrowed.into_column());
                Some(self.target_column.clone())
            }
            Err(_) => None,
        };

        for encoding in &self.categorical {
            let series = df
                .column(encoding.column())
                .map_err(|_| PreprocessingError::ColumnNotFound(encoding.column().to_string()))?
                .as_materialized_series();
            columns.extend(encoding.encode(series)?);
        }

        let dropped = self.unknown_columns(df);
        if !dropped.is_empty() {
            warn!("Dropping columns unknown to the encoding scheme: {:?}", dropped);
        }

        let mut features = DataFrame::new(columns)?;
        if let Some(target) = &target_column {
            features = move_target_to_last_frame(features, target)?;
        }
        narrow_frame(
            &mut features,
            self.narrowing
                .iter()
                .filter(|(name, _)| **name != self.target_column)
                .map(|(name, width)| (name.as_str(), *width)),
        )?;

        debug!(
            "Transformed {} rows into {} columns",
            features.height(),
            features.width()
        );
        Ok(FeatureMatrix {
            index,
            features,
            target_column,
        })
    }

    fn unknown_columns(&self, df: &DataFrame) -> Vec<String> {
        let known: HashSet<&str> = self
            .source_columns()
            .chain([self.id_column.as_str(), self.target_column.as_str()])
            .collect();
        df.get_column_names()
            .into_iter()
            .filter(|name| !known.contains(name.as_str()))
            .map(|name| name.to_string())
            .collect()
    }

    /// Write the scheme as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a scheme written by [`EncodingScheme::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(PreprocessingError::from)
            .context(format!("Reading encoding scheme {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn require_column(df: &DataFrame, name: &str) -> Result<()> {
    if df.column(name).is_err() {
        return Err(PreprocessingError::ColumnNotFound(name.to_string()));
    }
    Ok(())
}

/// String rendering of every value, nulls as [`NULL_CATEGORY`].
fn category_values(series: &Series) -> Result<Vec<String>> {
    Ok(series_as_strings(series)?
        .into_iter()
        .map(|value| value.unwrap_or_else(|| NULL_CATEGORY.to_string()))
        .collect())
}

/// Numeric categories sort by value, everything else lexicographically.
/// [`NULL_CATEGORY`] sorts last among numeric categories.
fn sorted_categories(mut categories: Vec<String>, numeric: bool) -> Vec<String> {
    if numeric {
        categories.sort_by(|a, b| {
            let a = parse_numeric_string(a).unwrap_or(f64::NAN);
            let b = parse_numeric_string(b).unwrap_or(f64::NAN);
            a.total_cmp(&b)
        });
    } else {
        categories.sort();
    }
    categories
}

fn encode_binary(encoding: &BinaryEncoding, series: &Series) -> Result<Column> {
    let encoded = category_values(series)?
        .iter()
        .map(|value| encoding.encode(value))
        .collect::<Result<Vec<i8>>>()?;
    Ok(Column::new(encoding.column.as_str().into(), encoded))
}

fn encode_one_hot(encoding: &OneHotEncoding, series: &Series) -> Result<Vec<Column>> {
    let values = category_values(series)?;
    let mut indicators = vec![vec![0i8; values.len()]; encoding.categories.len()];

    for (row, value) in values.iter().enumerate() {
        let position = encoding.position(value)?;
        indicators[position][row] = 1;
    }

    Ok(encoding
        .feature_names()
        .into_iter()
        .zip(indicators)
        .map(|(name, values)| Column::new(name.into(), values))
        .collect())
}
