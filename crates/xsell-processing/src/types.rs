use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed integer storage width used when narrowing numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
}

impl IntWidth {
    /// Range representable by this width. Inclusive, except that the `I64`
    /// upper bound (`i64::MAX` rounded to 2^63) is exclusive.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            IntWidth::I8 => (i8::MIN as f64, i8::MAX as f64),
            IntWidth::I16 => (i16::MIN as f64, i16::MAX as f64),
            IntWidth::I32 => (i32::MIN as f64, i32::MAX as f64),
            IntWidth::I64 => (i64::MIN as f64, i64::MAX as f64),
        }
    }

    /// Whether `value` is representable without loss.
    pub fn contains(self, value: f64) -> bool {
        let (lo, hi) = self.bounds();
        match self {
            IntWidth::I64 => value >= lo && value < hi,
            _ => value >= lo && value <= hi,
        }
    }

    /// Polars dtype for this width.
    pub fn dtype(self) -> DataType {
        match self {
            IntWidth::I8 => DataType::Int8,
            IntWidth::I16 => DataType::Int16,
            IntWidth::I32 => DataType::Int32,
            IntWidth::I64 => DataType::Int64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
        }
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific part of a column profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProfileDetail {
    /// Numeric column: observed range of non-null values.
    Numeric { min: Option<f64>, max: Option<f64> },
    /// String column: number of exactly-empty strings.
    Text { empty_count: usize },
    /// Any other dtype (boolean, temporal, nested).
    Other,
}

/// One diagnostic row of the column profiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub column: String,
    pub dtype: String,
    pub null_count: usize,
    /// Distinct non-null values.
    pub unique_count: usize,
    pub detail: ProfileDetail,
}

/// Column profiler output, one row per input column in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    pub rows: Vec<ProfileRow>,
}

impl ProfileTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up the profile of one column.
    pub fn get(&self, column: &str) -> Option<&ProfileRow> {
        self.rows.iter().find(|row| row.column == column)
    }
}
