//! Insurance Cross-Sell Preprocessing Library
//!
//! Feature preparation and the serving contract for a binary classifier that
//! predicts whether an existing health-insurance customer will buy vehicle
//! insurance, built on Polars.
//!
//! # Overview
//!
//! - **Configuration**: identifier, categorical and target column names from YAML
//! - **Profiling**: per-column dtype, null, distinct, range and empty-string counts
//! - **Encoding**: binary recoding, one-hot expansion and integer narrowing,
//!   split into a fit step and a replayable transform step
//! - **Threshold Search**: grid search of the decision threshold over a metric
//! - **Serving**: single-record validation, vectorization and a pluggable model
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use xsell_processing::{get_config, preprocess_with_scheme};
//! use polars::prelude::*;
//!
//! let config = get_config()?;
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("train.csv".into()))?
//!     .finish()?;
//!
//! let (matrix, scheme) = preprocess_with_scheme(df, &config)?;
//! scheme.save("scheme.json")?;
//! println!("Features: {:?}", matrix.column_names());
//! ```
//!
//! # Serving
//!
//! The fitted [`EncodingScheme`] and a [`serving::Predictor`] are combined in a
//! [`serving::PredictionService`], which turns one submitted record into
//! `"Customer is interested"` or `"Customer is not interested"`. See the
//! [`serving`] module documentation.

pub mod config;
pub mod encoder;
pub mod error;
pub mod profiler;
pub mod relocate;
pub mod serving;
pub mod threshold;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, Configuration, ConfigurationBuilder, get_config};
pub use encoder::{
    BinaryEncoding, CategoricalEncoding, EncodingScheme, FeatureMatrix, OneHotEncoding, preprocess,
    preprocess_with_scheme,
};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use profiler::{ColumnProfiler, initial_check};
pub use relocate::{Data, move_target_to_last, move_target_to_last_frame};
pub use serving::{
    ConstantPredictor, CustomerRecord, LogisticModel, PredictionResponse, PredictionService,
    Predictor, SchemaVersion, Verdict,
};
pub use threshold::{
    ClassificationMetric, ThresholdSearch, find_best_f1_threshold, find_best_threshold,
};
pub use types::{IntWidth, ProfileDetail, ProfileRow, ProfileTable};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype, parse_numeric_string};
