//! Error types for the cross-sell preprocessing core.
//!
//! Every failure here is a data or configuration defect rather than a
//! transient condition, so nothing is retried. Errors are serializable as
//! `{code, message}` so a serving front-end can hand them back as a generic
//! failure body.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the preprocessing core.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Configuration file missing, unreadable, malformed or invalid.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Input shape disagrees with what the operation expects.
    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    /// A raw value could not be parsed or represented as its expected numeric type.
    #[error("Cannot coerce value '{value}' in '{column}' to {target_type}")]
    TypeCoercion {
        column: String,
        value: String,
        target_type: String,
    },

    /// A value does not fit the integer width chosen for storage narrowing.
    #[error("Value {value} in column '{column}' does not fit in {width}")]
    RangeOverflow {
        column: String,
        value: f64,
        width: String,
    },

    /// A categorical value that the fitted encoding scheme never saw.
    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// Two inputs that must be aligned have different lengths.
    #[error("Length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Build a [`PreprocessingError::ConfigLoad`] from any displayable reason.
    pub fn config_load(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PreprocessingError::ConfigLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get a stable error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigLoad { .. } => "CONFIG_LOAD",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::TypeCoercion { .. } => "TYPE_COERCION",
            Self::RangeOverflow { .. } => "RANGE_OVERFLOW",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::LengthMismatch { .. } => "LENGTH_MISMATCH",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the input record rather than the
    /// deployment (configuration, scheme or model files).
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_)
            | Self::SchemaMismatch { .. }
            | Self::TypeCoercion { .. }
            | Self::RangeOverflow { .. }
            | Self::UnknownCategory { .. }
            | Self::LengthMismatch { .. } => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
