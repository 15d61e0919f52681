//! Cross-field consistency rules.
//!
//! Pair rules compare the presence of two operands; predicate rules evaluate
//! an arithmetic condition per row. Both run on the zero-blanked table, so
//! "present" means reported and non-zero.

use std::fmt;

use super::check::{Check, CheckKind, Flag, Verdicts};
use crate::error::Result;
use crate::input::{RowTable, Value};

/// Tolerance for equality between survey areas and volumes.
pub const AREA_TOLERANCE: f64 = 1e-9;

static MISSING: Value = Value::Missing;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= AREA_TOLERANCE
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// The required side of a pair rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Present where the column is present.
    Present(String),
    /// Present only where the column holds exactly this text.
    Equals(String, String),
    /// Present only where the column is missing.
    Absent(String),
}

impl Operand {
    pub fn present(column: impl Into<String>) -> Self {
        Operand::Present(column.into())
    }

    pub fn equals(column: impl Into<String>, text: impl Into<String>) -> Self {
        Operand::Equals(column.into(), text.into())
    }

    pub fn absent(column: impl Into<String>) -> Self {
        Operand::Absent(column.into())
    }

    pub fn column(&self) -> &str {
        match self {
            Operand::Present(c) | Operand::Equals(c, _) | Operand::Absent(c) => c,
        }
    }

    /// Per-row presence of the operand.
    pub fn mask(&self, table: &RowTable) -> Result<Vec<bool>> {
        match self {
            Operand::Present(column) => table.presence(column),
            Operand::Absent(column) => {
                Ok(table.presence(column)?.into_iter().map(|p| !p).collect())
            }
            Operand::Equals(column, text) => Ok(table
                .column(column)?
                .iter()
                .map(|v| matches!(v, Value::Text(s) if s.trim() == text))
                .collect()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Present(c) => write!(f, "'{}'", c),
            Operand::Equals(c, text) => write!(f, "'{}' is \"{}\"", c, text),
            Operand::Absent(c) => write!(f, "'{}' is missing", c),
        }
    }
}

/// Outcome of a pair rule for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairVerdict {
    /// The row takes no part in the rule.
    Excluded,
    Consistent,
    Mismatch,
}

/// Decide a pair rule from the presence of each side.
pub fn pair_verdict(required: bool, dependent: bool, two_way: bool) -> PairVerdict {
    match (required, dependent) {
        (false, false) => PairVerdict::Excluded,
        (true, true) => PairVerdict::Consistent,
        (true, false) => PairVerdict::Mismatch,
        (false, true) if two_way => PairVerdict::Mismatch,
        (false, true) => PairVerdict::Excluded,
    }
}

/// Flags rows where the required operand is present but the dependent
/// column is not. Two-way rules also flag the reverse.
#[derive(Debug, Clone)]
pub struct PairRule {
    name: String,
    required: Operand,
    dependent: String,
    two_way: bool,
}

impl PairRule {
    pub fn one_way(name: impl Into<String>, required: Operand, dependent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required,
            dependent: dependent.into(),
            two_way: false,
        }
    }

    pub fn two_way(name: impl Into<String>, required: Operand, dependent: impl Into<String>) -> Self {
        Self {
            two_way: true,
            ..Self::one_way(name, required, dependent)
        }
    }

    pub fn required(&self) -> &Operand {
        &self.required
    }

    pub fn dependent(&self) -> &str {
        &self.dependent
    }

    pub fn is_two_way(&self) -> bool {
        self.two_way
    }
}

impl Check for PairRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CheckKind {
        CheckKind::Pairwise
    }

    fn description(&self) -> String {
        if self.two_way {
            format!(
                "exactly one of {} and '{}' reported",
                self.required, self.dependent
            )
        } else {
            format!("{} reported without '{}'", self.required, self.dependent)
        }
    }

    fn evaluate(&self, table: &RowTable) -> Result<Verdicts> {
        let required = self.required.mask(table)?;
        let dependent = table.presence(&self.dependent)?;

        Ok(table
            .ids()
            .iter()
            .zip(required.into_iter().zip(dependent))
            .filter(|(_, (r, d))| pair_verdict(*r, *d, self.two_way) == PairVerdict::Mismatch)
            .map(|(id, _)| (*id, Flag::Yes))
            .collect())
    }
}

/// Read-only view of one row for predicate rules.
pub struct RowView<'a> {
    table: &'a RowTable,
    row: usize,
    /// Columns a rule may read; empty means any.
    declared: &'a [String],
}

impl<'a> RowView<'a> {
    pub fn new(table: &'a RowTable, row: usize) -> Self {
        Self::restricted(table, row, &[])
    }

    /// View limited to the columns a rule declared up front.
    pub fn restricted(table: &'a RowTable, row: usize, declared: &'a [String]) -> Self {
        Self {
            table,
            row,
            declared,
        }
    }

    pub fn value(&self, column: &str) -> &'a Value {
        debug_assert!(
            self.declared.is_empty() || self.declared.iter().any(|c| c == column),
            "column '{}' read but not declared by the rule",
            column
        );
        self.table.get(self.row, column).unwrap_or(&MISSING)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.value(column).as_number()
    }

    /// Number with a missing cell read as zero.
    pub fn allowance(&self, column: &str) -> f64 {
        self.number(column).unwrap_or(0.0)
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.value(column).as_text()
    }

    pub fn is_missing(&self, column: &str) -> bool {
        !self.value(column).is_present()
    }
}

pub type Predicate = fn(&RowView<'_>) -> bool;

/// Flags rows for which a condition over named columns holds.
#[derive(Clone)]
pub struct PredicateRule {
    name: String,
    description: String,
    columns: Vec<String>,
    test: Predicate,
}

impl PredicateRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        columns: &[&str],
        test: Predicate,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            test,
        }
    }

    /// Columns the predicate reads.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl fmt::Debug for PredicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRule")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .finish()
    }
}

impl Check for PredicateRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CheckKind {
        CheckKind::Predicate
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn evaluate(&self, table: &RowTable) -> Result<Verdicts> {
        let columns: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        table.require(&columns)?;

        Ok(table
            .ids()
            .iter()
            .enumerate()
            .filter(|(row, _)| (self.test)(&RowView::restricted(table, *row, &self.columns)))
            .map(|(_, id)| (*id, Flag::Yes))
            .collect())
    }
}
