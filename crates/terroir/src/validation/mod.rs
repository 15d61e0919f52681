//! Data-quality checks: grouped outliers and cross-field consistency rules.

pub mod catalogue;
mod check;
pub mod consistency;
pub mod outlier;

pub use catalogue::checks_for;
pub use check::{Check, CheckEngine, CheckKind, CheckOutcome, Flag, Verdicts};
pub use consistency::{Operand, PairRule, PairVerdict, PredicateRule, RowView};
pub use outlier::{GroupedOutlierDetector, Grouping, OutlierCheck, OutlierConfig, OutlierHit, Pass};
