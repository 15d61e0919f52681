//! In-memory survey table keyed by member identifier.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerroirError};

// Spreadsheet exports keep display formatting, e.g. "1,250.5".
static THOUSANDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("valid regex"));

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Interpret a raw cell from a delimited export.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_null_value(trimmed) {
            return Value::Missing;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Value::Number(n);
            }
        }
        if THOUSANDS.is_match(trimmed) {
            if let Ok(n) = trimmed.replace(',', "").parse::<f64>() {
                return Value::Number(n);
            }
        }
        Value::Text(trimmed.to_string())
    }

    /// Build a numeric cell, treating non-finite results as missing.
    pub fn number(n: Option<f64>) -> Self {
        match n {
            Some(v) if v.is_finite() => Value::Number(v),
            _ => Value::Missing,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

/// Check if a raw string represents a missing value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Survey respondent identifier (the membership number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub u64);

impl MemberId {
    /// Parse an identifier cell. Integral floats such as `42.0` are accepted.
    pub fn parse(raw: &str, row: usize) -> Result<Self> {
        let trimmed = raw.trim();
        let invalid = || TerroirError::InvalidIdentifier {
            row,
            value: raw.to_string(),
        };

        if let Ok(n) = trimmed.parse::<u64>() {
            return Ok(MemberId(n));
        }
        let n = trimmed.parse::<f64>().map_err(|_| invalid())?;
        if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
            Ok(MemberId(n as u64))
        } else {
            Err(invalid())
        }
    }

    /// Zero-padded representation. Identifiers wider than `width` are kept whole.
    pub fn padded(&self, width: usize) -> String {
        format!("{:0width$}", self.0, width = width)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Column-major table with one row per member.
#[derive(Debug, Clone)]
pub struct RowTable {
    ids: Vec<MemberId>,
    index: HashMap<MemberId, usize>,
    columns: IndexMap<String, Vec<Value>>,
}

impl RowTable {
    /// Create an empty-columned table for the given members.
    pub fn new(ids: Vec<MemberId>) -> Result<Self> {
        let mut index = HashMap::with_capacity(ids.len());
        for (row, id) in ids.iter().enumerate() {
            if index.insert(*id, row).is_some() {
                return Err(TerroirError::DuplicateIdentifier(id.0));
            }
        }

        Ok(Self {
            ids,
            index,
            columns: IndexMap::new(),
        })
    }

    /// Builder-style column insertion.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[MemberId] {
        &self.ids
    }

    /// Row position of a member.
    pub fn row_of(&self, id: MemberId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name, failing if it does not exist.
    pub fn column(&self, name: &str) -> Result<&[Value]> {
        self.columns
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| TerroirError::missing_column(name))
    }

    /// Fail with the first absent column, if any.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|n| !self.has_column(n)) {
            Some(name) => Err(TerroirError::missing_column(*name)),
            None => Ok(()),
        }
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|values| values.get(row))
    }

    /// Numeric view of a column; text cells are an error.
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.column(name)?
            .iter()
            .zip(&self.ids)
            .map(|(value, id)| match value {
                Value::Number(n) => Ok(Some(*n)),
                Value::Missing => Ok(None),
                Value::Text(s) => Err(TerroirError::NonNumeric {
                    column: name.to_string(),
                    id: id.0,
                    value: s.clone(),
                }),
            })
            .collect()
    }

    /// Numeric view with missing cells read as zero.
    pub fn filled(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .numbers(name)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    }

    /// Presence mask of a column.
    pub fn presence(&self, name: &str) -> Result<Vec<bool>> {
        Ok(self.column(name)?.iter().map(Value::is_present).collect())
    }

    /// Add a new column. Existing columns are never replaced.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if values.len() != self.ids.len() {
            return Err(TerroirError::LengthMismatch {
                column: name,
                expected: self.ids.len(),
                actual: values.len(),
            });
        }
        if self.columns.contains_key(&name) {
            return Err(TerroirError::DuplicateColumn(name));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Add a numeric column; non-finite entries become missing.
    pub fn insert_numbers(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        self.insert_column(name, values.into_iter().map(Value::number).collect())
    }

    /// Turn every numeric zero and non-finite number into a missing value.
    ///
    /// Survey forms record "not reported" as zero, so presence checks must
    /// run after this step.
    pub fn blank_zeros(&mut self) {
        for values in self.columns.values_mut() {
            for value in values.iter_mut() {
                if let Value::Number(n) = value {
                    if *n == 0.0 || !n.is_finite() {
                        *value = Value::Missing;
                    }
                }
            }
        }
    }

    /// Iterate rows as (identifier, values in column order).
    pub fn rows(&self) -> impl Iterator<Item = (MemberId, Vec<&Value>)> + '_ {
        self.ids.iter().enumerate().map(move |(row, id)| {
            let values = self.columns.values().map(|col| &col[row]).collect();
            (*id, values)
        })
    }
}
