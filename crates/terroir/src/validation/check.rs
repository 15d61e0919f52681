//! The check abstraction and the engine that runs a catalogue of checks.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::Result;
use crate::input::{MemberId, RowTable};

/// Payload of a report cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flag {
    /// The row fails a consistency rule.
    Yes,
    /// The original value that was judged unusual.
    Value(f64),
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Yes => f.write_str("Yes"),
            Flag::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Flag::Yes => serializer.serialize_str("Yes"),
            Flag::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

/// Flags raised by one check, keyed by member.
pub type Verdicts = BTreeMap<MemberId, Flag>;

/// Family a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Grouped z-score outlier detection.
    Outlier,
    /// Presence/absence rule over two operands.
    Pairwise,
    /// Arithmetic condition over one or more columns.
    Predicate,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Outlier => "Outlier",
            CheckKind::Pairwise => "Pairwise",
            CheckKind::Predicate => "Predicate",
        }
    }
}

/// A single data-quality check writing one report column.
pub trait Check {
    /// Report column name.
    fn name(&self) -> &str;

    fn kind(&self) -> CheckKind;

    /// Human-readable description for reviewers.
    fn description(&self) -> String;

    /// Evaluate against a prepared table. Fails only on schema errors.
    fn evaluate(&self, table: &RowTable) -> Result<Verdicts>;
}

/// Result of running one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub kind: CheckKind,
    pub description: String,
    #[serde(skip)]
    pub flags: Verdicts,
}

impl CheckOutcome {
    pub fn flagged(&self) -> usize {
        self.flags.len()
    }
}

/// Runs an ordered list of checks over one table.
pub struct CheckEngine {
    checks: Vec<Box<dyn Check>>,
}

impl CheckEngine {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    pub fn checks(&self) -> &[Box<dyn Check>] {
        &self.checks
    }

    /// Run every check in order. The first schema error aborts the run.
    pub fn run(&self, table: &RowTable) -> Result<Vec<CheckOutcome>> {
        self.checks
            .iter()
            .map(|check| {
                Ok(CheckOutcome {
                    name: check.name().to_string(),
                    kind: check.kind(),
                    description: check.description(),
                    flags: check.evaluate(table)?,
                })
            })
            .collect()
    }
}
