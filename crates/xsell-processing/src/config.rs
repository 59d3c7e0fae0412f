//! Configuration for the cross-sell preprocessing core.
//!
//! The raw-data schema (identifier, categorical and target columns) is read
//! from a YAML document and validated eagerly, so a misnamed key fails at load
//! time instead of deep inside the encoder.
//!
//! ```yaml
//! raw_data:
//!   id_column: id
//!   categorical_cols: [Gender, Vehicle_Age, Vehicle_Damage]
//!   target_cols: Response
//! narrowing:
//!   Age: i8
//! ```

use crate::error::{PreprocessingError, Result};
use crate::types::IntWidth;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the bundled configuration, relative to the crate root.
pub const DEFAULT_CONFIG_RELATIVE_PATH: &str = "config/config.yaml";

/// Storage widths for the known numeric columns of the insurance dataset.
pub const DEFAULT_NARROWING: [(&str, IntWidth); 9] = [
    ("Gender", IntWidth::I8),
    ("Vehicle_Damage", IntWidth::I8),
    ("Age", IntWidth::I8),
    ("Driving_License", IntWidth::I8),
    ("Region_Code", IntWidth::I8),
    ("Previously_Insured", IntWidth::I8),
    ("Annual_Premium", IntWidth::I32),
    ("Policy_Sales_Channel", IntWidth::I16),
    ("Vintage", IntWidth::I16),
];

/// Width used for the target column and for one-hot indicator columns.
pub const TARGET_WIDTH: IntWidth = IntWidth::I8;

/// Absolute path of the bundled configuration file.
pub fn default_config_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_RELATIVE_PATH)
}

/// Load the configuration from its fixed location.
///
/// Every call re-reads the file; there is no cache and no side effect besides
/// the read, so repeated calls return equal values.
pub fn get_config() -> Result<Configuration> {
    Configuration::from_path(default_config_path())
}

/// Validated raw-data schema.
///
/// Use [`Configuration::builder()`] to construct one in code, or
/// [`Configuration::from_path`] to read the YAML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Unique key column. Used as the row index, never as a feature.
    pub id_column: String,

    /// Categorical columns in encoding order. Duplicate-free.
    pub categorical_cols: Vec<String>,

    /// Binary response column.
    pub target_col: String,

    /// Per-column width overrides on top of [`DEFAULT_NARROWING`].
    #[serde(default)]
    pub narrowing: BTreeMap<String, IntWidth>,
}

impl Configuration {
    /// Create a new configuration builder.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Read and validate a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        debug!("Loading configuration from {}", path_str);

        let content = std::fs::read_to_string(path)
            .map_err(|e| PreprocessingError::config_load(&path_str, e))?;
        Self::parse(&content).map_err(|reason| PreprocessingError::config_load(path_str, reason))
    }

    /// Parse and validate a YAML document held in memory.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::parse(content).map_err(|reason| PreprocessingError::config_load("<inline>", reason))
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let file: ConfigFile = serde_yaml::from_str(content).map_err(|e| e.to_string())?;

        // raw_data.target_cols wins over the flattened top-level key
        let target = file
            .raw_data
            .target_cols
            .or(file.target_cols)
            .ok_or_else(|| "missing key 'raw_data.target_cols'".to_string())?
            .into_single()?;

        let config = Configuration {
            id_column: file.raw_data.id_column,
            categorical_cols: file.raw_data.categorical_cols,
            target_col: target,
            narrowing: file.narrowing,
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.id_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyName("id_column"));
        }
        if self.target_col.trim().is_empty() {
            return Err(ConfigValidationError::EmptyName("target_cols"));
        }
        if self.id_column == self.target_col {
            return Err(ConfigValidationError::Overlap(self.id_column.clone()));
        }

        let mut seen = HashSet::new();
        for col in &self.categorical_cols {
            if col.trim().is_empty() {
                return Err(ConfigValidationError::EmptyName("categorical_cols"));
            }
            if *col == self.id_column || *col == self.target_col {
                return Err(ConfigValidationError::Overlap(col.clone()));
            }
            if !seen.insert(col.as_str()) {
                return Err(ConfigValidationError::DuplicateCategorical(col.clone()));
            }
        }

        Ok(())
    }

    /// Whether `column` is configured as categorical.
    pub fn is_categorical(&self, column: &str) -> bool {
        self.categorical_cols.iter().any(|c| c == column)
    }

    /// Documented widths merged with the configured overrides.
    pub fn narrowing_plan(&self) -> BTreeMap<String, IntWidth> {
        let mut plan: BTreeMap<String, IntWidth> = DEFAULT_NARROWING
            .iter()
            .map(|(name, width)| (name.to_string(), *width))
            .collect();
        plan.extend(self.narrowing.iter().map(|(k, v)| (k.clone(), *v)));
        plan
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must not be empty")]
    EmptyName(&'static str),

    #[error("Column '{0}' is listed as categorical more than once")]
    DuplicateCategorical(String),

    #[error("Column '{0}' cannot be both identifier/target and another role")]
    Overlap(String),
}

/// On-disk layout of the YAML document.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    raw_data: RawDataSection,
    #[serde(default)]
    target_cols: Option<TargetCols>,
    #[serde(default)]
    narrowing: BTreeMap<String, IntWidth>,
}

#[derive(Debug, Deserialize)]
struct RawDataSection {
    id_column: String,
    categorical_cols: Vec<String>,
    #[serde(default)]
    target_cols: Option<TargetCols>,
}

/// `target_cols` is written either as a scalar or as a one-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetCols {
    One(String),
    Many(Vec<String>),
}

impl TargetCols {
    fn into_single(self) -> std::result::Result<String, String> {
        match self {
            TargetCols::One(name) => Ok(name),
            TargetCols::Many(mut names) if names.len() == 1 => Ok(names.remove(0)),
            TargetCols::Many(names) => Err(format!(
                "expected exactly one target column, found {}",
                names.len()
            )),
        }
    }
}

/// Builder for [`Configuration`] with fluent API.
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    id_column: Option<String>,
    categorical_cols: Vec<String>,
    target_col: Option<String>,
    narrowing: BTreeMap<String, IntWidth>,
}

impl ConfigurationBuilder {
    /// Set the identifier column (default: `id`).
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Append a categorical column.
    pub fn categorical(mut self, column: impl Into<String>) -> Self {
        self.categorical_cols.push(column.into());
        self
    }

    /// Replace the categorical column list.
    pub fn categorical_cols<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_cols = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the target column (default: `Response`).
    pub fn target_col(mut self, column: impl Into<String>) -> Self {
        self.target_col = Some(column.into());
        self
    }

    /// Override the storage width of one column.
    pub fn narrow(mut self, column: impl Into<String>, width: IntWidth) -> Self {
        self.narrowing.insert(column.into(), width);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `Configuration` or an error if validation fails.
    pub fn build(self) -> std::result::Result<Configuration, ConfigValidationError> {
        let config = Configuration {
            id_column: self.id_column.unwrap_or_else(|| "id".to_string()),
            categorical_cols: self.categorical_cols,
            target_col: self.target_col.unwrap_or_else(|| "Response".to_string()),
            narrowing: self.narrowing,
        };

        config.validate()?;
        Ok(config)
    }
}
