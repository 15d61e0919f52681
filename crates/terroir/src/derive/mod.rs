//! Derived metric columns.
//!
//! Derivations read summands with missing cells as zero, the way the survey
//! spreadsheets were totalled. A ratio whose denominator is zero is missing.
//! Once every derived column exists, [`RowTable::blank_zeros`] turns zeros
//! back into missing values so the checks see "not reported" consistently.

pub mod vineyard;
pub mod winery;

use crate::error::Result;
use crate::input::{RowTable, Value};
use crate::section::Section;

/// Marker meaning the member performs an activity themselves.
pub const PERFORM_MARKER: &str = "We perform";

/// Add the columns the audit checks need, then blank zeros.
pub fn prepare_for_audit(table: &mut RowTable, section: Section) -> Result<()> {
    match section {
        Section::Vineyard => vineyard::derive_check_metrics(table)?,
        Section::Winery => winery::derive_check_metrics(table)?,
    }
    table.blank_zeros();
    Ok(())
}

/// Add every derived column for the section, then blank zeros.
pub fn derive_all(table: &mut RowTable, section: Section) -> Result<()> {
    match section {
        Section::Vineyard => {
            vineyard::derive_check_metrics(table)?;
            vineyard::derive_sustainability_metrics(table)?;
        }
        Section::Winery => winery::derive_check_metrics(table)?,
    }
    table.blank_zeros();
    Ok(())
}

/// Zero-filled row sum of several columns.
pub(crate) fn sum(table: &RowTable, columns: &[&str]) -> Result<Vec<f64>> {
    let mut total = vec![0.0; table.len()];
    for column in columns {
        for (acc, v) in total.iter_mut().zip(table.filled(column)?) {
            *acc += v;
        }
    }
    Ok(total)
}

/// Element-wise sum of already derived series.
pub(crate) fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Element-wise ratio; a zero denominator leaves the cell missing.
pub(crate) fn ratio(numerator: &[f64], denominator: &[f64]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| if *d == 0.0 { None } else { Some(n / d) })
        .collect()
}

pub(crate) fn scale(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

/// Ratio series read back as a zero-filled series for further sums.
pub(crate) fn or_zero(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(0.0)).collect()
}

pub(crate) fn some(values: Vec<f64>) -> Vec<Option<f64>> {
    values.into_iter().map(Some).collect()
}

/// Normalize a categorical answer column to booleans: `true` exactly where
/// the cell holds `marker`.
pub fn marker_flags(table: &RowTable, column: &str, marker: &str) -> Result<Vec<bool>> {
    Ok(table
        .column(column)?
        .iter()
        .map(|v| matches!(v, Value::Text(s) if s.trim() == marker))
        .collect())
}

/// Count, per row, how many of the columns hold a positive number.
pub(crate) fn count_positive(table: &RowTable, columns: &[&str]) -> Result<Vec<f64>> {
    let mut counts = vec![0.0; table.len()];
    for column in columns {
        for (acc, v) in counts.iter_mut().zip(table.filled(column)?) {
            if v > 0.0 {
                *acc += 1.0;
            }
        }
    }
    Ok(counts)
}
