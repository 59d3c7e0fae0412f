//! Integer narrowing of numeric columns.
//!
//! Narrowing only changes storage width. Every value is range-checked and
//! integrality-checked before the cast, so a value that does not fit is an
//! error rather than a silent wrap.

use crate::error::{PreprocessingError, Result};
use crate::types::IntWidth;
use crate::utils::{is_numeric_dtype, series_as_f64, series_as_strings};
use polars::prelude::*;
use tracing::debug;

/// Narrow `series` to `width` without altering any value.
///
/// Nulls stay null. Fails with [`PreprocessingError::TypeCoercion`] for a
/// non-numeric column or a fractional value, and with
/// [`PreprocessingError::RangeOverflow`] for a value outside `width`.
pub fn narrow_series(series: &Series, width: IntWidth) -> Result<Series> {
    let column = series.name().to_string();

    if series.dtype() == &width.dtype() {
        return Ok(series.clone());
    }

    if !is_numeric_dtype(series.dtype()) {
        let sample = series_as_strings(series)?
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_default();
        return Err(PreprocessingError::TypeCoercion {
            column,
            value: sample,
            target_type: width.to_string(),
        });
    }

    for value in series_as_f64(series)?.into_iter().flatten() {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(PreprocessingError::TypeCoercion {
                column,
                value: value.to_string(),
                target_type: width.to_string(),
            });
        }
        if !width.contains(value) {
            return Err(PreprocessingError::RangeOverflow {
                column,
                value,
                width: width.to_string(),
            });
        }
    }

    debug!("Narrowing '{}' from {:?} to {}", column, series.dtype(), width);
    Ok(series.strict_cast(&width.dtype())?)
}

/// Narrow every column of `df` that has an entry in `plan`.
///
/// Columns absent from `df` are skipped; the plan covers the whole raw schema
/// while a given frame may carry only part of it.
pub fn narrow_frame<'a, I>(df: &mut DataFrame, plan: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, IntWidth)>,
{
    for (name, width) in plan {
        let Ok(column) = df.column(name) else {
            continue;
        };
        let narrowed = narrow_series(column.as_materialized_series(), width)?;
        df.with_column(narrowed)?;
    }
    Ok(())
}
